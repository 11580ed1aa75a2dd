use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Convert a matched RWF amount into whole currency units.
///
/// `integer` may carry thousands separators (`,` or `.`); they are stripped.
/// `fraction` is the optional minor part after the decimal mark and is
/// truncated away.
pub fn whole_units(integer: &str, fraction: Option<&str>) -> Option<i64> {
    let digits: String = integer.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let text = match fraction.filter(|f| !f.is_empty()) {
        Some(f) => format!("{digits}.{f}"),
        None => digits,
    };
    let dec = Decimal::from_str(&text).ok()?;
    dec.trunc().to_i64()
}

/// Render whole RWF with comma grouping, e.g. `1,500,000 RWF`.
pub fn format_rwf(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped} RWF")
}
