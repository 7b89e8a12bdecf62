//! 交易日历与日期参数解析
//!
//! 交易日历属于外部协作方，这里只约定接口并提供一个按周末剔除的实现。

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::common::beijing_now;

/// 交易日历: 给定基准日和数量，返回其后的有序交易日
pub trait TradingCalendar: Send + Sync {
    fn window(&self, base: NaiveDate, count: usize) -> Vec<NaiveDate>;
}

/// 只剔除周末的日历（不含法定节假日）
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayCalendar;

impl TradingCalendar for WeekdayCalendar {
    fn window(&self, base: NaiveDate, count: usize) -> Vec<NaiveDate> {
        let mut days = Vec::with_capacity(count);
        let mut current = base;
        while days.len() < count {
            current += Duration::days(1);
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                days.push(current);
            }
        }
        days
    }
}

/// 今天（北京时间）
pub fn today() -> NaiveDate {
    beijing_now().date_naive()
}

/// 解析日期参数，支持 YYYY-MM-DD 和 YYYYMMDD
pub fn parse_trade_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}

/// 以 anchor 结尾的最近 n 个自然日，按时间正序
pub fn recent_days(anchor: NaiveDate, n: u32) -> Vec<NaiveDate> {
    (0..n as i64)
        .rev()
        .map(|offset| anchor - Duration::days(offset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_trade_date(s).unwrap()
    }

    #[test]
    fn test_window_skips_weekends() {
        // 2024-01-05 是周五
        let window = WeekdayCalendar.window(d("2024-01-05"), 5);
        assert_eq!(
            window,
            vec![d("2024-01-08"), d("2024-01-09"), d("2024-01-10"), d("2024-01-11"), d("2024-01-12")]
        );
    }

    #[test]
    fn test_window_excludes_base_date() {
        let window = WeekdayCalendar.window(d("2024-01-02"), 1);
        assert_eq!(window, vec![d("2024-01-03")]);
        assert!(WeekdayCalendar.window(d("2024-01-02"), 0).is_empty());
    }

    #[test]
    fn test_parse_trade_date_formats() {
        assert_eq!(parse_trade_date("2024-01-02"), parse_trade_date("20240102"));
        assert!(parse_trade_date("2024/01/02").is_none());
        assert!(parse_trade_date("").is_none());
    }

    #[test]
    fn test_recent_days_oldest_first() {
        let days = recent_days(d("2024-01-10"), 3);
        assert_eq!(days, vec![d("2024-01-08"), d("2024-01-09"), d("2024-01-10")]);
    }
}
