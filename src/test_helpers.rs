//! 测试用数据源桩和样例数据

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{field, BatchResponse, BatchTable, DailyBar};
use crate::services::cache::{CacheWriter, StorageClient};
use crate::services::calendar::WeekdayCalendar;
use crate::services::limit_up::SnapshotSource;
use crate::services::performance::{BatchPerformanceSource, DailyBarSource, PerformanceAggregator};
use crate::services::pipeline::{PacingPolicy, PipelineOrchestrator};

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// 一行 StockList：时间戳为 0，成交额 123456789 元
pub fn stock_row(code: &str, name: &str) -> Value {
    let mut fields = vec![json!(""); 14];
    fields[field::CODE] = json!(code);
    fields[field::NAME] = json!(name);
    fields[field::LIMIT_UP_TS] = json!(0);
    fields[field::BOARD_KIND] = json!("首板");
    fields[field::AMOUNT] = json!(123_456_789);
    Value::Array(fields)
}

/// 单板块快照响应
pub fn snapshot_payload(stocks: &[(&str, &str)]) -> String {
    let list: Vec<Value> = stocks.iter().map(|(c, n)| stock_row(c, n)).collect();
    json!({"list": [{"ZSName": "机器人", "StockList": list}]}).to_string()
}

/// 快照桩：按日期返回预设结果
#[derive(Default)]
pub struct FakeSnapshot {
    pub payloads: HashMap<NaiveDate, String>,
    pub failing: HashSet<NaiveDate>,
}

impl FakeSnapshot {
    pub fn with_day(date: NaiveDate, stocks: &[(&str, &str)]) -> Self {
        let mut fake = Self::default();
        fake.payloads.insert(date, snapshot_payload(stocks));
        fake
    }
}

#[async_trait]
impl SnapshotSource for FakeSnapshot {
    async fn fetch_raw(&self, date: NaiveDate) -> PipelineResult<String> {
        if self.failing.contains(&date) {
            return Err(PipelineError::TransientNetwork("获取涨停快照失败: 502".to_string()));
        }
        Ok(self.payloads.get(&date).cloned().unwrap_or_else(|| r#"{"list":[]}"#.to_string()))
    }
}

/// 批量接口桩：窗口内每天每只股票都返回 1.5
#[derive(Default)]
pub struct FakeBatch {
    pub calls: AtomicUsize,
}

#[async_trait]
impl BatchPerformanceSource for FakeBatch {
    async fn fetch_batch(
        &self,
        ts_codes: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> PipelineResult<BatchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut items = Vec::new();
        let mut day = start;
        while day <= end {
            for ts in ts_codes {
                items.push(vec![json!(ts), json!(day.format("%Y%m%d").to_string()), json!(1.5)]);
            }
            day = day.succ_opt().unwrap();
        }
        Ok(BatchResponse {
            code: 0,
            msg: None,
            data: Some(BatchTable {
                fields: vec!["ts_code".into(), "trade_date".into(), "pct_chg".into()],
                items,
            }),
        })
    }
}

/// 日K线桩：没有任何数据
pub struct NoBars;

#[async_trait]
impl DailyBarSource for NoBars {
    async fn fetch_daily_bars(&self, _symbol: &str, _count: usize) -> PipelineResult<Vec<DailyBar>> {
        Ok(Vec::new())
    }
}

/// 无停顿的管道配置
pub fn quiet_config() -> PipelineConfig {
    PipelineConfig {
        wave_pause_ms: 0,
        date_pause_ms: 0,
        ..PipelineConfig::default()
    }
}

pub fn test_orchestrator(
    snapshot: FakeSnapshot,
    batch: Arc<FakeBatch>,
    storage: StorageClient,
) -> PipelineOrchestrator {
    test_orchestrator_with(snapshot, batch, storage, quiet_config())
}

pub fn test_orchestrator_with(
    snapshot: FakeSnapshot,
    batch: Arc<FakeBatch>,
    storage: StorageClient,
    cfg: PipelineConfig,
) -> PipelineOrchestrator {
    let aggregator = PerformanceAggregator::new(
        batch,
        Arc::new(NoBars),
        PacingPolicy::from(&cfg),
        cfg.bar_count,
        Duration::from_secs(1),
        Duration::from_secs(1),
    );
    PipelineOrchestrator::new(
        Arc::new(snapshot),
        Arc::new(WeekdayCalendar),
        aggregator,
        CacheWriter::new(storage),
        &cfg,
    )
}

/// 组装一个 HTTP/1.1 响应
pub fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

/// 读完一个请求（请求头加 Content-Length 指定的请求体）
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let body_len = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + body_len {
                return;
            }
        }
    }
}

/// 本地一次性 HTTP 服务：读完请求后等待 delay 再回写 response，返回其 URL
pub async fn serve_once(response: String, delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            read_request(&mut socket).await;
            tokio::time::sleep(delay).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{}/", addr)
}

/// 不走系统代理的客户端
pub fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
