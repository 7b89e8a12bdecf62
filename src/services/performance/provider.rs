//! 表现数据源
//!
//! - 批量接口（Tushare daily）：一次请求查询全部股票在窗口内的涨跌幅
//! - 日K线接口（新浪）：逐只查询最近 N 根日K线，作为兜底

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use serde_json::json;
use std::sync::OnceLock;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{BatchResponse, DailyBar};
use crate::services::common::preview;

/// 批量涨跌幅数据源
#[async_trait]
pub trait BatchPerformanceSource: Send + Sync {
    /// ts_codes 为带后缀的代码，start/end 为窗口首尾
    async fn fetch_batch(
        &self,
        ts_codes: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> PipelineResult<BatchResponse>;
}

/// 单只股票日K线数据源
#[async_trait]
pub trait DailyBarSource: Send + Sync {
    /// symbol 为带前缀的代码，返回按日期正序的K线
    async fn fetch_daily_bars(&self, symbol: &str, count: usize) -> PipelineResult<Vec<DailyBar>>;
}

/// Tushare 批量日线接口
pub struct TushareBatchSource {
    client: Client,
    url: String,
    token: String,
}

impl TushareBatchSource {
    pub fn new(client: Client, url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl BatchPerformanceSource for TushareBatchSource {
    async fn fetch_batch(
        &self,
        ts_codes: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> PipelineResult<BatchResponse> {
        let body = json!({
            "api_name": "daily",
            "token": self.token,
            "params": {
                "ts_code": ts_codes.join(","),
                "start_date": start.format("%Y%m%d").to_string(),
                "end_date": end.format("%Y%m%d").to_string(),
            },
            "fields": "ts_code,trade_date,pct_chg",
        });

        log::info!(
            "📡 请求批量涨跌幅 URL: {} ({} 只, {} ~ {})",
            self.url,
            ts_codes.len(),
            start,
            end
        );

        let response = self.client.post(&self.url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(PipelineError::TransientNetwork(format!(
                "获取批量涨跌幅失败: {}",
                response.status()
            )));
        }

        let text = response.text().await?;
        log::debug!("📥 批量接口原始响应: {}", preview(&text, 300));
        Ok(serde_json::from_str(&text)?)
    }
}

/// 新浪日K线接口
pub struct SinaDailyBarSource {
    client: Client,
    url: String,
}

impl SinaDailyBarSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DailyBarSource for SinaDailyBarSource {
    async fn fetch_daily_bars(&self, symbol: &str, count: usize) -> PipelineResult<Vec<DailyBar>> {
        // scale=240 表示日线
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("symbol", symbol),
                ("scale", "240"),
                ("ma", "no"),
                ("datalen", &count.to_string()),
            ])
            .header("Referer", "https://finance.sina.com.cn/")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::TransientNetwork(format!(
                "获取 {} 日K线失败: {}",
                symbol,
                response.status()
            )));
        }

        let text = response.text().await?;
        parse_daily_bars(&text)
    }
}

fn jsonp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\((\[.*\])\)").expect("valid jsonp regex"))
}

/// 解析日K线响应，兼容纯 JSON 数组和 JSONP 包裹
///
/// 格式: =([{"day":"2024-01-02","close":"10.20",...},...]);
pub fn parse_daily_bars(data: &str) -> PipelineResult<Vec<DailyBar>> {
    let trimmed = data.trim();
    let json_str = if trimmed.starts_with('[') {
        trimmed
    } else {
        jsonp_pattern()
            .captures(trimmed)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| PipelineError::DataShape(format!("无效的K线数据: {}", preview(trimmed, 80))))?
    };

    let mut bars: Vec<DailyBar> = serde_json::from_str(json_str)?;
    bars.sort_by(|a, b| a.day.cmp(&b.day));
    Ok(bars)
}
