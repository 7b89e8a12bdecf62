//! 管道运行结果与接口参数

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{LimitUpRecord, PerformanceMatrix, PerformanceSource};

/// 单日运行结果（只返回和记录日志，不入库）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub base_date: NaiveDate,
    /// 规范化后的涨停记录数
    pub record_count: usize,
    /// 表现窗口的交易日数
    pub trading_day_count: usize,
    /// 表现矩阵单元格数
    pub performance_record_count: usize,
    pub duration_ms: u64,
    /// 仅当快照为空时为 false
    pub success: bool,
    pub message: String,
    pub performance_source: PerformanceSource,
    /// 快照分区是否写入成功
    pub snapshot_persisted: bool,
    /// 表现分区是否写入成功
    pub performance_persisted: bool,
}

impl PipelineRun {
    pub fn empty(base_date: NaiveDate, duration_ms: u64) -> Self {
        Self {
            base_date,
            record_count: 0,
            trading_day_count: 0,
            performance_record_count: 0,
            duration_ms,
            success: false,
            message: "no records".to_string(),
            performance_source: PerformanceSource::None,
            snapshot_persisted: false,
            performance_persisted: false,
        }
    }
}

/// 多日预加载汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentRunSummary {
    pub anchor_date: NaiveDate,
    pub days: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_records: usize,
    pub total_performance_records: usize,
    pub duration_ms: u64,
    pub runs: Vec<PipelineRun>,
}

/// 缓存中的某日数据
#[derive(Debug, Clone, Serialize)]
pub struct CachedDay {
    pub date: NaiveDate,
    pub records: Vec<LimitUpRecord>,
    pub performance: PerformanceMatrix,
}

/// 运行接口参数
#[derive(Debug, Deserialize)]
pub struct RunQuery {
    /// 日期（YYYY-MM-DD 或 YYYYMMDD，缺省为今天）
    pub date: Option<String>,
}

/// 管理接口请求体
#[derive(Debug, Deserialize)]
pub struct AdminRequest {
    /// preload 或 preload_recent
    pub action: String,
    pub date: Option<String>,
}
