//! 涨停快照数据模型
//!
//! 包含上游快照接口的原始结构和规范化后的涨停记录

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 规范化后的单只涨停股票
///
/// 唯一标识: (stock_code, trade_date)，trade_date 由缓存分区携带
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LimitUpRecord {
    /// 股票代码（6 位数字）
    pub stock_code: String,
    /// 股票名称
    pub stock_name: String,
    /// 所属板块
    pub sector_label: String,
    /// 连板描述，如 "首板"、"2连板"
    pub board_kind: String,
    /// 成交额（亿元，保留两位小数）
    pub trade_amount: f64,
    /// 首次涨停时间 HH:MM
    pub limit_up_time: String,
}

/// 快照接口原始响应
///
/// 格式: {"list": [{"ZSName": "板块", "StockList": [[...], ...]}], ...}
#[derive(Debug, Deserialize, Default)]
pub struct RawSnapshot {
    #[serde(default)]
    pub list: Vec<RawCategory>,
}

/// 原始板块分组
#[derive(Debug, Deserialize, Default)]
pub struct RawCategory {
    /// 板块名称
    #[serde(rename = "ZSName", alias = "Name", default)]
    pub label: Option<String>,
    /// 定长字段数组，每个元素对应一只股票（组内按时间倒序）
    #[serde(rename = "StockList", default)]
    pub stock_list: Vec<Vec<Value>>,
}

/// StockList 行内字段下标
pub mod field {
    pub const CODE: usize = 0;
    pub const NAME: usize = 1;
    pub const LIMIT_UP_TS: usize = 6;
    pub const BOARD_KIND: usize = 9;
    pub const AMOUNT: usize = 13;
}
