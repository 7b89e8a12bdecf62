//! 业务逻辑服务模块
//!
//! 快照抓取、表现聚合、缓存写入以及串联它们的预加载管道

pub mod cache;       // SQLite 缓存
pub mod calendar;    // 交易日历
pub mod common;      // HTTP 客户端等公共工具
pub mod limit_up;    // 涨停快照
pub mod performance; // 后续表现
pub mod pipeline;    // 预加载管道
