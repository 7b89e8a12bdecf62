//! 股票代码 -> 交易所映射
//!
//! 按代码前两位判断，先匹配先得，未匹配的一律归深交所。

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    /// 上交所
    Shanghai,
    /// 深交所
    Shenzhen,
    /// 北交所
    Beijing,
}

const RULES: [(&[&str], Exchange); 3] = [
    (&["60", "68", "51"], Exchange::Shanghai),
    (&["00", "30", "12"], Exchange::Shenzhen),
    (&["43", "83", "87"], Exchange::Beijing),
];

impl Exchange {
    /// 根据代码前缀识别交易所
    pub fn of(code: &str) -> Exchange {
        let code = code.trim();
        let prefix = code.get(..2).unwrap_or(code);
        RULES
            .iter()
            .find(|(prefixes, _)| prefixes.contains(&prefix))
            .map(|(_, exchange)| *exchange)
            .unwrap_or(Exchange::Shenzhen)
    }

    /// 大写后缀，如 SH
    pub fn suffix(self) -> &'static str {
        match self {
            Exchange::Shanghai => "SH",
            Exchange::Shenzhen => "SZ",
            Exchange::Beijing => "BJ",
        }
    }

    /// 小写前缀，如 sh
    pub fn prefix(self) -> &'static str {
        match self {
            Exchange::Shanghai => "sh",
            Exchange::Shenzhen => "sz",
            Exchange::Beijing => "bj",
        }
    }
}

/// 后缀形式，如 600000 -> 600000.SH（批量接口使用）
pub fn qualified_code(code: &str) -> String {
    let code = code.trim();
    format!("{}.{}", code, Exchange::of(code).suffix())
}

/// 前缀形式，如 600000 -> sh600000（日K线接口使用）
pub fn prefixed_symbol(code: &str) -> String {
    let code = code.trim();
    format!("{}{}", Exchange::of(code).prefix(), code)
}

/// 去掉后缀还原为纯代码，如 600000.SH -> 600000
pub fn strip_qualifier(ts_code: &str) -> &str {
    ts_code.split('.').next().unwrap_or(ts_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_prefixes() {
        let cases = vec![
            ("600000", "600000.SH"),
            ("688981", "688981.SH"),
            ("510300", "510300.SH"),
            ("000001", "000001.SZ"),
            ("300750", "300750.SZ"),
            ("123001", "123001.SZ"),
            ("430047", "430047.BJ"),
            ("831010", "831010.BJ"),
            ("873122", "873122.BJ"),
        ];
        for (input, expected) in &cases {
            assert_eq!(qualified_code(input), *expected, "{} 映射错误", input);
        }
    }

    #[test]
    fn test_unmatched_prefix_defaults_to_shenzhen() {
        for code in ["002594", "159915", "900901", "201000", "7", ""] {
            assert_eq!(Exchange::of(code), Exchange::Shenzhen, "{} 应归深交所", code);
        }
    }

    #[test]
    fn test_total_and_deterministic_over_all_prefixes() {
        for n in 0..100 {
            let code = format!("{:02}1234", n);
            let first = Exchange::of(&code);
            let second = Exchange::of(&code);
            assert_eq!(first, second);
            assert!(matches!(
                first,
                Exchange::Shanghai | Exchange::Shenzhen | Exchange::Beijing
            ));
        }
    }

    #[test]
    fn test_prefixed_symbol_and_strip() {
        assert_eq!(prefixed_symbol("600000"), "sh600000");
        assert_eq!(prefixed_symbol("300750"), "sz300750");
        assert_eq!(prefixed_symbol("430047"), "bj430047");
        assert_eq!(strip_qualifier("600000.SH"), "600000");
        assert_eq!(strip_qualifier("600000"), "600000");
    }
}
