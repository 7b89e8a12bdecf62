//! 涨停快照服务模块
//!
//! 抓取上游快照并规范化为涨停记录

pub mod fetcher;
pub mod normalizer;

pub use fetcher::{KplSnapshotFetcher, SnapshotSource};
pub use normalizer::normalize_payload;
