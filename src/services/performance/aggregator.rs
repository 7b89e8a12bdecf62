//! 后续表现聚合
//!
//! 先用批量接口一次查询全部股票；批量接口报错、状态非 0 或结果为空时，
//! 整体切换为逐只拉取日K线（不混用两种来源）。
//!
//! 逐只拉取按批次并发，批次之间停顿；单只失败或超时只保留默认的 0，
//! 不影响整体结果。

use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use super::exchange::{prefixed_symbol, qualified_code, strip_qualifier};
use super::provider::{BatchPerformanceSource, DailyBarSource};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{round2, BatchRow, DailyBar, PerformanceMatrix, PerformanceSource};
use crate::services::pipeline::PacingPolicy;

/// 批量查询的判定结果
#[derive(Debug)]
pub enum BatchVerdict {
    /// 批量结果可用，覆盖全部股票
    Accepted(Vec<BatchRow>),
    /// 需要整体兜底，附带原因
    Fallback(String),
}

/// 聚合结果
#[derive(Debug)]
pub struct AggregateOutcome {
    pub matrix: PerformanceMatrix,
    pub source: PerformanceSource,
    /// 兜底阶段失败（保留 0）的股票数
    pub failed_codes: usize,
}

pub struct PerformanceAggregator {
    batch: Arc<dyn BatchPerformanceSource>,
    bars: Arc<dyn DailyBarSource>,
    pacing: PacingPolicy,
    bar_count: usize,
    batch_timeout: Duration,
    bar_timeout: Duration,
}

impl PerformanceAggregator {
    pub fn new(
        batch: Arc<dyn BatchPerformanceSource>,
        bars: Arc<dyn DailyBarSource>,
        pacing: PacingPolicy,
        bar_count: usize,
        batch_timeout: Duration,
        bar_timeout: Duration,
    ) -> Self {
        Self {
            batch,
            bars,
            pacing,
            bar_count,
            batch_timeout,
            bar_timeout,
        }
    }

    /// 计算 codes × window 的稠密表现矩阵，不会返回错误
    pub async fn aggregate(&self, codes: &[String], window: &[NaiveDate]) -> AggregateOutcome {
        let mut matrix = PerformanceMatrix::new(codes, window);

        let (start, end) = match (window.iter().min(), window.iter().max()) {
            (Some(s), Some(e)) if !codes.is_empty() => (*s, *e),
            _ => {
                return AggregateOutcome {
                    matrix,
                    source: PerformanceSource::None,
                    failed_codes: 0,
                }
            }
        };

        match self.query_primary(codes, start, end).await {
            BatchVerdict::Accepted(rows) => {
                let written = rows
                    .iter()
                    .filter(|row| matrix.set(strip_qualifier(&row.ts_code), row.trade_date, row.pct_chg))
                    .count();
                log::info!("✅ 批量接口返回 {} 行，写入 {} 个单元格", rows.len(), written);
                AggregateOutcome {
                    matrix,
                    source: PerformanceSource::Primary,
                    failed_codes: 0,
                }
            }
            BatchVerdict::Fallback(reason) => {
                log::warn!("⚠️ {}，{} 只股票全部改用日K线兜底", reason, codes.len());
                let failed_codes = self.fill_from_daily_bars(&mut matrix, codes).await;
                AggregateOutcome {
                    matrix,
                    source: PerformanceSource::Fallback,
                    failed_codes,
                }
            }
        }
    }

    /// 发起批量查询并判定是否需要兜底
    pub async fn query_primary(&self, codes: &[String], start: NaiveDate, end: NaiveDate) -> BatchVerdict {
        let ts_codes: Vec<String> = codes.iter().map(|c| qualified_code(c)).collect();

        let request = self.batch.fetch_batch(&ts_codes, start, end);
        let response = match tokio::time::timeout(self.batch_timeout, request).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => return BatchVerdict::Fallback(format!("批量接口请求失败: {}", e)),
            Err(_) => {
                let e = PipelineError::timeout("批量接口", self.batch_timeout.as_secs());
                return BatchVerdict::Fallback(e.to_string());
            }
        };

        if !response.is_ok() {
            return BatchVerdict::Fallback(format!(
                "批量接口状态异常: code={} msg={}",
                response.code,
                response.msg.as_deref().unwrap_or("")
            ));
        }

        match response.rows() {
            Ok(rows) if !rows.is_empty() => BatchVerdict::Accepted(rows),
            Ok(_) => BatchVerdict::Fallback("批量接口返回空结果".to_string()),
            Err(e) => BatchVerdict::Fallback(format!("批量接口数据异常: {}", e)),
        }
    }

    /// 按批次逐只拉取日K线并写入矩阵，返回失败的股票数
    async fn fill_from_daily_bars(&self, matrix: &mut PerformanceMatrix, codes: &[String]) -> usize {
        let waves: Vec<&[String]> = codes.chunks(self.pacing.wave_size.max(1)).collect();
        let total = waves.len();
        let mut failed = 0;

        for (i, wave) in waves.into_iter().enumerate() {
            let results = join_all(wave.iter().map(|code| self.fetch_changes(code))).await;

            // 每只股票只写自己的那一行
            for (code, result) in wave.iter().zip(results) {
                match result {
                    Ok(changes) => {
                        for (date, pct) in changes {
                            matrix.set(code, date, pct);
                        }
                    }
                    Err(e) => {
                        failed += 1;
                        log::warn!("获取 {} 日K线失败，保留默认值: {}", code, e);
                    }
                }
            }

            if i + 1 < total {
                tokio::time::sleep(self.pacing.wave_pause).await;
            }
        }

        log::info!("📊 兜底完成: {} 只，失败 {} 只", codes.len(), failed);
        failed
    }

    async fn fetch_changes(&self, code: &str) -> PipelineResult<Vec<(NaiveDate, f64)>> {
        let symbol = prefixed_symbol(code);
        let bars = tokio::time::timeout(self.bar_timeout, self.bars.fetch_daily_bars(&symbol, self.bar_count))
            .await
            .map_err(|_| PipelineError::timeout(&symbol, self.bar_timeout.as_secs()))??;
        Ok(daily_changes(&bars))
    }
}

/// 由相邻收盘价计算逐日涨跌幅（第一根K线没有前值，不产出）
pub fn daily_changes(bars: &[DailyBar]) -> Vec<(NaiveDate, f64)> {
    bars.windows(2)
        .filter_map(|pair| {
            let prev = pair[0].close;
            let current = &pair[1];
            if prev <= 0.0 {
                return None;
            }
            let day = current.day.get(..10).unwrap_or(&current.day);
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
            Some((date, round2((current.close - prev) / prev * 100.0)))
        })
        .collect()
}
