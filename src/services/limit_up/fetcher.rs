//! 涨停快照抓取
//!
//! 对接开盘啦历史涨停接口，表单 POST，只发一次请求，不重试。
//! 成功时原样返回响应文本，解析交给 normalizer。

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};
use crate::services::common::preview;

/// 协议常量
const SNAPSHOT_ACTION: &str = "GetPlateInfo_w38";
const SNAPSHOT_CONTROLLER: &str = "HisLimitResumption";
const PHONE_OS: &str = "2";
const APP_VERSION: &str = "5.11.0.6";

/// 快照数据源
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// 获取某日的原始快照文本
    async fn fetch_raw(&self, date: NaiveDate) -> PipelineResult<String>;
}

/// 开盘啦快照接口
pub struct KplSnapshotFetcher {
    client: Client,
    url: String,
    timeout: Duration,
}

impl KplSnapshotFetcher {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }

    async fn send(&self, day: &str) -> PipelineResult<String> {
        let form = [
            ("a", SNAPSHOT_ACTION),
            ("c", SNAPSHOT_CONTROLLER),
            ("Day", day),
            ("PhoneOSNew", PHONE_OS),
            ("VerSion", APP_VERSION),
        ];

        let response = self.client.post(&self.url).form(&form).send().await?;

        if !response.status().is_success() {
            return Err(PipelineError::TransientNetwork(format!(
                "获取涨停快照失败: {}",
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl SnapshotSource for KplSnapshotFetcher {
    async fn fetch_raw(&self, date: NaiveDate) -> PipelineResult<String> {
        let day = date.format("%Y%m%d").to_string();
        log::info!("📡 请求涨停快照 URL: {} Day={}", self.url, day);

        let text = tokio::time::timeout(self.timeout, self.send(&day))
            .await
            .map_err(|_| PipelineError::timeout("涨停快照", self.timeout.as_secs()))??;

        log::debug!("📥 快照原始响应: {}", preview(&text, 300));
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{d, http_response, local_client, serve_once};

    fn fetcher(url: String, timeout: Duration) -> KplSnapshotFetcher {
        KplSnapshotFetcher::new(local_client(), url, timeout)
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let body = r#"{"list":[]}"#;
        let url = serve_once(http_response("200 OK", body), Duration::ZERO).await;

        let text = fetcher(url, Duration::from_secs(5)).fetch_raw(d("2024-01-02")).await.unwrap();
        assert_eq!(text, body);
    }

    #[tokio::test]
    async fn test_non_success_status_is_transient() {
        let url = serve_once(http_response("502 Bad Gateway", ""), Duration::ZERO).await;

        let err = fetcher(url, Duration::from_secs(5)).fetch_raw(d("2024-01-02")).await.unwrap_err();
        assert!(matches!(err, PipelineError::TransientNetwork(ref m) if m.contains("502")), "{}", err);
    }

    #[tokio::test]
    async fn test_budget_exceeded_is_transient() {
        let url = serve_once(http_response("200 OK", "{}"), Duration::from_secs(5)).await;

        let err = fetcher(url, Duration::from_millis(100)).fetch_raw(d("2024-01-02")).await.unwrap_err();
        assert!(matches!(err, PipelineError::TransientNetwork(ref m) if m.contains("超时")), "{}", err);
    }
}
