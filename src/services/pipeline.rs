//! 涨停数据预加载管道
//!
//! 单日流程（严格串行）：
//! 1. 抓取快照并规范化，为空则直接返回 success=false
//! 2. 写入快照分区（失败只记日志）
//! 3. 由交易日历生成表现窗口
//! 4. 聚合表现矩阵
//! 5. 写入表现分区（失败只记日志）
//!
//! 多日模式按日期逐个串行执行，日期之间固定停顿。

use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{AppConfig, PipelineConfig};
use crate::error::PipelineResult;
use crate::models::{PipelineRun, RecentRunSummary};
use crate::services::cache::{CacheWriter, WriteOutcome};
use crate::services::calendar::{recent_days, TradingCalendar, WeekdayCalendar};
use crate::services::common::build_client;
use crate::services::limit_up::{normalize_payload, KplSnapshotFetcher, SnapshotSource};
use crate::services::performance::{PerformanceAggregator, SinaDailyBarSource, TushareBatchSource};

/// 对上游的节奏控制
#[derive(Debug, Clone, Copy)]
pub struct PacingPolicy {
    /// 兜底时每批并发请求数
    pub wave_size: usize,
    /// 兜底批次之间的停顿
    pub wave_pause: Duration,
    /// 多日模式日期之间的停顿
    pub date_pause: Duration,
}

impl From<&PipelineConfig> for PacingPolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            wave_size: config.wave_size,
            wave_pause: config.wave_pause(),
            date_pause: config.date_pause(),
        }
    }
}

pub struct PipelineOrchestrator {
    snapshot: Arc<dyn SnapshotSource>,
    calendar: Arc<dyn TradingCalendar>,
    aggregator: PerformanceAggregator,
    writer: CacheWriter,
    window_days: usize,
    recent_days: u32,
    pacing: PacingPolicy,
}

impl PipelineOrchestrator {
    pub fn new(
        snapshot: Arc<dyn SnapshotSource>,
        calendar: Arc<dyn TradingCalendar>,
        aggregator: PerformanceAggregator,
        writer: CacheWriter,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            snapshot,
            calendar,
            aggregator,
            writer,
            window_days: config.window_days,
            recent_days: config.recent_days,
            pacing: PacingPolicy::from(config),
        }
    }

    /// 按配置组装真实数据源
    pub fn from_config(config: &AppConfig, writer: CacheWriter) -> PipelineResult<Self> {
        let client = build_client(&config.api)?;
        let providers = &config.providers;
        let pipeline = &config.pipeline;

        let snapshot = KplSnapshotFetcher::new(
            client.clone(),
            providers.snapshot_url.clone(),
            Duration::from_secs(pipeline.snapshot_timeout_secs),
        );
        let aggregator = PerformanceAggregator::new(
            Arc::new(TushareBatchSource::new(
                client.clone(),
                providers.batch_url.clone(),
                providers.batch_token.clone(),
            )),
            Arc::new(SinaDailyBarSource::new(client, providers.daily_bar_url.clone())),
            PacingPolicy::from(pipeline),
            pipeline.bar_count,
            Duration::from_secs(pipeline.batch_timeout_secs),
            Duration::from_secs(pipeline.bar_timeout_secs),
        );

        Ok(Self::new(
            Arc::new(snapshot),
            Arc::new(WeekdayCalendar),
            aggregator,
            writer,
            pipeline,
        ))
    }

    pub fn writer(&self) -> &CacheWriter {
        &self.writer
    }

    /// 处理单日，不会返回错误
    pub async fn run(&self, date: NaiveDate) -> PipelineRun {
        let started = Instant::now();
        log::info!("🚀 开始预加载 {} 涨停数据", date);

        let records = match self.snapshot.fetch_raw(date).await {
            Ok(payload) => normalize_payload(&payload),
            Err(e) => {
                log::warn!("获取 {} 涨停快照失败，按零条记录处理: {}", date, e);
                Vec::new()
            }
        };

        if records.is_empty() {
            log::warn!("{} 没有涨停记录，跳过后续步骤", date);
            return PipelineRun::empty(date, elapsed_ms(started));
        }

        let snapshot_persisted = persisted("涨停快照", date, self.writer.replace_snapshot(date, &records));

        let window = self.calendar.window(date, self.window_days);
        let codes = unique_codes(records.iter().map(|r| r.stock_code.as_str()));
        let outcome = self.aggregator.aggregate(&codes, &window).await;

        let performance_persisted = persisted(
            "表现矩阵",
            date,
            self.writer.replace_performance(date, &window, &outcome.matrix),
        );

        let mut message = format!(
            "完成: {} 条涨停记录, {} 个交易日, 表现来源 {:?}",
            records.len(),
            window.len(),
            outcome.source
        );
        if outcome.failed_codes > 0 {
            message.push_str(&format!(", {} 只无表现数据", outcome.failed_codes));
        }

        let run = PipelineRun {
            base_date: date,
            record_count: records.len(),
            trading_day_count: window.len(),
            performance_record_count: outcome.matrix.record_count(),
            duration_ms: elapsed_ms(started),
            success: true,
            message,
            performance_source: outcome.source,
            snapshot_persisted,
            performance_persisted,
        };
        log::info!("✅ {} {} (耗时 {}ms)", date, run.message, run.duration_ms);
        run
    }

    /// 以 anchor 结尾的最近若干自然日，逐日串行处理
    pub async fn run_recent(&self, anchor: NaiveDate) -> RecentRunSummary {
        let started = Instant::now();
        let days = recent_days(anchor, self.recent_days);
        let total = days.len();
        let mut runs = Vec::with_capacity(total);

        for (i, date) in days.into_iter().enumerate() {
            runs.push(self.run(date).await);
            if i + 1 < total {
                tokio::time::sleep(self.pacing.date_pause).await;
            }
        }

        let succeeded = runs.iter().filter(|r| r.success).count();
        let summary = RecentRunSummary {
            anchor_date: anchor,
            days: total,
            succeeded,
            failed: total - succeeded,
            total_records: runs.iter().map(|r| r.record_count).sum(),
            total_performance_records: runs.iter().map(|r| r.performance_record_count).sum(),
            duration_ms: elapsed_ms(started),
            runs,
        };
        log::info!(
            "📊 最近 {} 天预加载完成: 成功 {} 天, 失败 {} 天, 共 {} 条记录",
            summary.days,
            summary.succeeded,
            summary.failed,
            summary.total_records
        );
        summary
    }
}

/// 写入失败在这里吞掉，只通过返回值体现
fn persisted(what: &str, date: NaiveDate, result: PipelineResult<WriteOutcome>) -> bool {
    match result {
        Ok(WriteOutcome::Written(_)) => true,
        Ok(WriteOutcome::Skipped) => false,
        Err(e) => {
            log::error!("❌ 写入 {} {} 失败，继续执行: {}", date, what, e);
            false
        }
    }
}

/// 去重并保持首次出现的顺序
fn unique_codes<'a>(codes: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    codes
        .filter(|c| seen.insert(*c))
        .map(str::to_string)
        .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
