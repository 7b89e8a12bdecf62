//! 通用 API 响应模型
//!
//! 定义统一的 API 响应格式

use serde::{Deserialize, Serialize};

use crate::services::common::beijing_now;

/// 统一 API 响应结构
///
/// 所有接口返回统一格式，包含：
/// - success: 请求是否成功
/// - data: 响应数据
/// - message: 响应消息
/// - timestamp: 响应时间戳（北京时间）
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    /// ISO 8601 格式
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self::new(true, "Success".to_string(), Some(data))
    }

    /// 创建错误响应
    pub fn error(message: String) -> Self {
        Self::new(false, message, None)
    }

    /// 携带数据的响应，成功标志由调用方决定（如管道部分成功）
    pub fn with_status(success: bool, message: String, data: T) -> Self {
        Self::new(success, message, Some(data))
    }

    fn new(success: bool, message: String, data: Option<T>) -> Self {
        Self {
            success,
            data,
            message,
            timestamp: beijing_now().to_rfc3339(),
        }
    }
}
