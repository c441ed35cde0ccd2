use chrono::NaiveDate;

use crate::models::field::{FieldValue, TradeField};

/// Shown instead of an amount that is missing or not a finite number.
pub const MISSING_AMOUNT: &str = "N/A";

/// Format an amount with thousands separators and two decimals
/// (`1234567.5` → `"1,234,567.50"`).
pub fn format_amount(value: Option<f64>) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return MISSING_AMOUNT.to_string();
    };

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Prefix a `dd-mm-yyyy` date with its weekday (`"15-01-2025"` → `"Wed 15-01-2025"`).
///
/// Missing dates render empty; text that is not a valid date is shown as-is.
pub fn format_trade_date(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return String::new();
    };
    match NaiveDate::parse_from_str(raw, "%d-%m-%Y") {
        Ok(date) => format!("{} {raw}", date.format("%a")),
        Err(_) => raw.to_string(),
    }
}

/// Display text of one compared cell.
///
/// Amount fields are read numerically whatever kind the cell has, so
/// `"1,250.5"` and `1250.5` render alike even though they compare unequal.
pub fn format_field(field: TradeField, value: FieldValue<'_>) -> String {
    match value {
        _ if field.is_amount() => format_amount(value.as_number()),
        FieldValue::Text(text) if field.is_date() => format_trade_date(Some(text)),
        FieldValue::Missing if field.is_date() => String::new(),
        other => other.to_string(),
    }
}
