//! 后续表现服务模块
//!
//! 批量接口优先，失败时整体切换为逐只日K线兜底

pub mod aggregator;
pub mod exchange;
pub mod provider;

pub use aggregator::PerformanceAggregator;
pub use provider::{BatchPerformanceSource, DailyBarSource, SinaDailyBarSource, TushareBatchSource};
