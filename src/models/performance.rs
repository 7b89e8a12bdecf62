//! 后续表现数据模型
//!
//! 定义表现矩阵，以及批量接口和日K线接口的响应结构

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{PipelineError, PipelineResult};

/// 四舍五入到两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 表现矩阵: 股票代码 -> (交易日 -> 涨跌幅%)
///
/// 构造时即为每个 (代码, 日期) 组合填 0，之后只允许覆盖窗口内的日期，
/// 因此每个代码始终拥有完整的窗口日期。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerformanceMatrix {
    cells: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl PerformanceMatrix {
    pub fn new(codes: &[String], window: &[NaiveDate]) -> Self {
        let cells = codes
            .iter()
            .map(|code| {
                let row = window.iter().map(|d| (*d, 0.0)).collect();
                (code.clone(), row)
            })
            .collect();
        Self { cells }
    }

    /// 写入一个值，代码或日期不在矩阵内时忽略，返回是否写入
    pub fn set(&mut self, code: &str, date: NaiveDate, pct_change: f64) -> bool {
        match self.cells.get_mut(code).and_then(|row| row.get_mut(&date)) {
            Some(cell) => {
                *cell = round2(pct_change);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, code: &str, date: NaiveDate) -> Option<f64> {
        self.cells.get(code).and_then(|row| row.get(&date)).copied()
    }

    pub fn row(&self, code: &str) -> Option<&BTreeMap<NaiveDate, f64>> {
        self.cells.get(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<NaiveDate, f64>)> {
        self.cells.iter()
    }

    /// 代码数量
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 单元格总数（代码数 × 窗口天数）
    pub fn record_count(&self) -> usize {
        self.cells.values().map(|row| row.len()).sum()
    }

    /// 从缓存中重建（不做稠密补齐）
    pub fn from_cells(cells: BTreeMap<String, BTreeMap<NaiveDate, f64>>) -> Self {
        Self { cells }
    }
}

/// 矩阵数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceSource {
    /// 批量接口一次返回
    Primary,
    /// 逐只兜底拉取
    Fallback,
    /// 未执行（无股票或无窗口）
    None,
}

/// 批量日线接口响应
///
/// 格式: {"code": 0, "msg": "", "data": {"fields": [...], "items": [[...]]}}
#[derive(Debug, Deserialize)]
pub struct BatchResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<BatchTable>,
}

/// 批量接口的表格数据
#[derive(Debug, Deserialize, Default)]
pub struct BatchTable {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub items: Vec<Vec<Value>>,
}

/// 批量接口的一行: 某只股票某一天的涨跌幅
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRow {
    /// 带交易所后缀的代码，如 600000.SH
    pub ts_code: String,
    pub trade_date: NaiveDate,
    pub pct_chg: f64,
}

impl BatchResponse {
    pub const OK: i64 = 0;

    pub fn is_ok(&self) -> bool {
        self.code == Self::OK
    }

    /// 按字段名解析表格行
    ///
    /// 缺少必需列视为结构异常；单行解析失败则跳过该行。
    pub fn rows(&self) -> PipelineResult<Vec<BatchRow>> {
        let table = match &self.data {
            Some(t) => t,
            None => return Ok(Vec::new()),
        };

        let column = |name: &str| {
            table
                .fields
                .iter()
                .position(|f| f == name)
                .ok_or_else(|| PipelineError::DataShape(format!("批量响应缺少字段 {}", name)))
        };
        let code_idx = column("ts_code")?;
        let date_idx = column("trade_date")?;
        let pct_idx = column("pct_chg")?;

        let rows = table
            .items
            .iter()
            .filter_map(|item| {
                let ts_code = item.get(code_idx)?.as_str()?.to_string();
                let trade_date =
                    NaiveDate::parse_from_str(item.get(date_idx)?.as_str()?, "%Y%m%d").ok()?;
                let pct_chg = value_as_f64(item.get(pct_idx)?)?;
                Some(BatchRow { ts_code, trade_date, pct_chg })
            })
            .collect();
        Ok(rows)
    }
}

/// 日K线（兜底接口），只用到日期和收盘价
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DailyBar {
    /// 交易日 YYYY-MM-DD
    pub day: String,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub close: f64,
}

/// 兼容字符串和数字两种写法，如 "10.20" 与 10.2
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn de_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_as_f64(&value).ok_or_else(|| serde::de::Error::custom(format!("无效数值: {}", value)))
}
