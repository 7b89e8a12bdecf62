//! 管道错误类型
//!
//! 上游数据源异常只在产生它的组件内部降级处理，
//! 持久化异常在编排层记录日志后跳过。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// 超时或非成功状态码
    #[error("网络请求失败: {0}")]
    TransientNetwork(String),
    /// 响应 JSON 结构与预期不符
    #[error("数据格式异常: {0}")]
    DataShape(String),
    /// 存储不可用或写入失败
    #[error("持久化失败: {0}")]
    Persistence(String),
}

impl PipelineError {
    pub fn timeout(what: &str, secs: u64) -> Self {
        PipelineError::TransientNetwork(format!("{} 超时 ({}s)", what, secs))
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::TransientNetwork(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::DataShape(e.to_string())
    }
}

impl From<rusqlite::Error> for PipelineError {
    fn from(e: rusqlite::Error) -> Self {
        PipelineError::Persistence(e.to_string())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
