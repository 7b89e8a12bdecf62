//! 本地缓存模块
//!
//! 涨停快照分区与表现矩阵分区的存储和替换写入

pub mod storage;
pub mod writer;

pub use storage::StorageClient;
pub use writer::{CacheWriter, WriteOutcome};
