//! 涨停快照规范化
//!
//! 把快照接口的板块分组 + 定长字段数组转换为 LimitUpRecord，并剔除：
//! - 名称含退市标记的股票
//! - 代码以 4 或 8 开头的股票
//!
//! 纯函数，不做任何 I/O；输入为空或无法解析时返回空列表。

use chrono::TimeZone;
use chrono_tz::Asia::Shanghai;
use serde_json::Value;

use crate::models::{field, round2, value_as_f64, LimitUpRecord, RawCategory, RawSnapshot};

pub const DELISTING_MARKER: &str = "退";
pub const EXCLUDED_PREFIXES: [char; 2] = ['4', '8'];
pub const DEFAULT_SECTOR: &str = "unclassified";
pub const DEFAULT_BOARD_KIND: &str = "first-board";
pub const DEFAULT_LIMIT_UP_TIME: &str = "09:30";

const HUNDRED_MILLION: f64 = 100_000_000.0;

/// 解析原始响应文本并规范化
pub fn normalize_payload(payload: &str) -> Vec<LimitUpRecord> {
    match serde_json::from_str::<RawSnapshot>(payload) {
        Ok(snapshot) => normalize(&snapshot),
        Err(e) => {
            log::warn!("快照数据格式异常，按空结果处理: {}", e);
            Vec::new()
        }
    }
}

/// 规范化所有板块
pub fn normalize(snapshot: &RawSnapshot) -> Vec<LimitUpRecord> {
    snapshot.list.iter().flat_map(normalize_category).collect()
}

fn normalize_category(category: &RawCategory) -> Vec<LimitUpRecord> {
    let sector = category
        .label
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SECTOR);

    // 上游组内按涨停时间倒序，翻转后恢复时间正序
    category
        .stock_list
        .iter()
        .rev()
        .filter_map(|row| to_record(row, sector))
        .filter(|r| !is_excluded(&r.stock_code, &r.stock_name))
        .collect()
}

fn to_record(row: &[Value], sector: &str) -> Option<LimitUpRecord> {
    let stock_code = text_at(row, field::CODE)?;
    let stock_name = text_at(row, field::NAME)?;

    let board_kind = text_at(row, field::BOARD_KIND).unwrap_or_else(|| DEFAULT_BOARD_KIND.to_string());
    let timestamp = row.get(field::LIMIT_UP_TS).and_then(value_as_f64).unwrap_or(0.0) as i64;
    let amount = row.get(field::AMOUNT).and_then(value_as_f64).unwrap_or(0.0);

    Some(LimitUpRecord {
        stock_code,
        stock_name,
        sector_label: sector.to_string(),
        board_kind,
        trade_amount: to_hundred_million(amount),
        limit_up_time: format_limit_up_time(timestamp),
    })
}

/// 非空字符串字段；数字字段转为字符串
fn text_at(row: &[Value], idx: usize) -> Option<String> {
    let text = match row.get(idx)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// 是否应被过滤（退市标记或北交所/三板代码）
pub fn is_excluded(stock_code: &str, stock_name: &str) -> bool {
    stock_name.contains(DELISTING_MARKER) || stock_code.starts_with(EXCLUDED_PREFIXES)
}

/// 元 -> 亿元，保留两位小数
pub fn to_hundred_million(amount: f64) -> f64 {
    round2(amount / HUNDRED_MILLION)
}

/// unix 秒 -> 北京时间 HH:MM，非正数返回 09:30
pub fn format_limit_up_time(timestamp: i64) -> String {
    if timestamp <= 0 {
        return DEFAULT_LIMIT_UP_TIME.to_string();
    }
    match Shanghai.timestamp_opt(timestamp, 0).single() {
        Some(t) => t.format("%H:%M").to_string(),
        None => DEFAULT_LIMIT_UP_TIME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// 构造一行 StockList（14 个字段）
    fn row(code: &str, name: &str, ts: i64, board: &str, amount: f64) -> Value {
        let mut fields = vec![json!(""); 14];
        fields[field::CODE] = json!(code);
        fields[field::NAME] = json!(name);
        fields[field::LIMIT_UP_TS] = json!(ts);
        fields[field::BOARD_KIND] = json!(board);
        fields[field::AMOUNT] = json!(amount);
        Value::Array(fields)
    }

    #[test]
    fn test_amount_conversion() {
        assert_eq!(to_hundred_million(123_456_789.0), 1.23);
        assert_eq!(to_hundred_million(0.0), 0.0);
        assert_eq!(to_hundred_million(1_255_000_000.0), 12.55);
    }

    #[test]
    fn test_limit_up_time() {
        assert_eq!(format_limit_up_time(0), "09:30");
        assert_eq!(format_limit_up_time(-5), "09:30");
        // 2024-01-02 01:35:00 UTC = 09:35 北京时间
        assert_eq!(format_limit_up_time(1_704_159_300), "09:35");
    }

    #[test]
    fn test_exclusion_rules() {
        assert!(is_excluded("430047", "诺思兰德"));
        assert!(is_excluded("830799", "艾融软件"));
        assert!(is_excluded("600001", "退市海润"));
        assert!(!is_excluded("600000", "浦发银行"));
        assert!(!is_excluded("300750", "宁德时代"));
    }

    #[test]
    fn test_two_categories_drop_delisted_keep_order() {
        let payload = json!({
            "list": [
                {
                    "ZSName": "人工智能",
                    "StockList": [
                        row("300001", "特锐德", 1_704_160_000, "2连板", 300_000_000.0),
                        row("000002", "*ST退市", 1_704_159_500, "首板", 100_000_000.0),
                        row("600003", "东北高速", 1_704_159_300, "首板", 200_000_000.0),
                    ]
                },
                {
                    "ZSName": "机器人",
                    "StockList": [
                        row("002004", "华邦健康", 0, "", 123_456_789.0),
                        row("600005", "武钢股份", 1_704_159_000, "3连板", 50_000_000.0),
                    ]
                }
            ]
        })
        .to_string();

        let records = normalize_payload(&payload);
        let codes: Vec<&str> = records.iter().map(|r| r.stock_code.as_str()).collect();
        assert_eq!(codes, vec!["600003", "300001", "600005", "002004"]);

        let last = &records[3];
        assert_eq!(last.sector_label, "机器人");
        assert_eq!(last.board_kind, DEFAULT_BOARD_KIND);
        assert_eq!(last.limit_up_time, "09:30");
        assert_eq!(last.trade_amount, 1.23);
    }

    #[test]
    fn test_no_excluded_record_survives() {
        let stocks: Vec<Value> = [
            ("430001", "北交一号"),
            ("830002", "三板二号"),
            ("873003", "北交三号"),
            ("600004", "退市四号"),
            ("000005", "正常五号"),
            ("688006", "正常六号"),
        ]
        .iter()
        .map(|(c, n)| row(c, n, 0, "首板", 1.0))
        .collect();
        let payload = json!({"list": [{"ZSName": "混合", "StockList": stocks}]}).to_string();

        let records = normalize_payload(&payload);
        assert_eq!(records.len(), 2);
        for r in &records {
            assert!(!r.stock_code.starts_with('4') && !r.stock_code.starts_with('8'));
            assert!(!r.stock_name.contains(DELISTING_MARKER));
        }
    }

    #[test]
    fn test_missing_label_and_short_rows() {
        let payload = json!({
            "list": [{"StockList": [["600000"], ["600001", "短行"]]}]
        })
        .to_string();

        let records = normalize_payload(&payload);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stock_code, "600001");
        assert_eq!(records[0].sector_label, DEFAULT_SECTOR);
        assert_eq!(records[0].trade_amount, 0.0);
    }

    #[test]
    fn test_empty_and_malformed_payloads() {
        assert!(normalize_payload("").is_empty());
        assert!(normalize_payload("not json").is_empty());
        assert!(normalize_payload("{}").is_empty());
        assert!(normalize_payload(r#"{"list": []}"#).is_empty());
        assert!(normalize_payload(r#"{"list": "oops"}"#).is_empty());
    }
}
