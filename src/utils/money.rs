// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 金额解析，统一换算为最小货币单位

/// 将十进制金额字符串（如 `"12.5"`）换算为两位小数的最小货币单位
///
/// 超过两位的小数按四舍五入处理，格式非法时返回 `None`
pub fn parse_minor_units(value: &str) -> Option<i64> {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut cents: i64 = 0;
    for (i, c) in fraction.chars().take(2).enumerate() {
        let digit = c.to_digit(10)? as i64;
        cents += if i == 0 { digit * 10 } else { digit };
    }
    if let Some(third) = fraction.chars().nth(2) {
        if third >= '5' {
            cents += 1;
        }
    }

    let total = whole.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -total } else { total })
}

/// 从 JSON 值中解析金额，兼容字符串与数字两种表示
pub fn minor_units_from_json(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::String(s) => parse_minor_units(s),
        serde_json::Value::Number(n) => parse_minor_units(&n.to_string()),
        _ => None,
    }
}
