//! Display formatting for slide text: dates, money, periods.
//!
//! All of it is best effort. Anything that doesn't parse is shown as it came
//! in, so a surprising input never costs more than a less tidy slide.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::domain::{FieldValue, PLACEHOLDER};

const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];
const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

const CURRENCY_SYMBOLS: [char; 5] = ['$', '€', '£', '¥', '₡'];

/// Try the known input patterns in order.
pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// Rewrite a date string to `output_fmt`, or return it unchanged.
pub fn reformat_date(raw: &str, output_fmt: &str) -> String {
    let Some(date) = parse_date_lenient(raw) else {
        return raw.to_string();
    };
    let mut out = String::new();
    match write!(out, "{}", date.format(output_fmt)) {
        Ok(()) => out,
        Err(_) => raw.to_string(),
    }
}

/// A story/field date for display.
pub fn format_date(value: &FieldValue, output_fmt: &str) -> String {
    match value.as_text() {
        Some(text) => reformat_date(&text, output_fmt),
        None => PLACEHOLDER.to_string(),
    }
}

/// Whether a `chrono` format string is usable for output.
pub fn is_valid_date_format(fmt: &str) -> bool {
    !fmt.is_empty() && !StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error))
}

/// A monetary value with `suffix` appended, unless it already names a
/// currency. The placeholder is left alone.
pub fn format_money(value: &FieldValue, suffix: &str) -> String {
    let Some(text) = value.as_text() else {
        return PLACEHOLDER.to_string();
    };
    let trimmed = text.trim();
    if suffix.is_empty() || has_currency_marker(trimmed, suffix) {
        trimmed.to_string()
    } else {
        format!("{trimmed} {suffix}")
    }
}

fn has_currency_marker(s: &str, suffix: &str) -> bool {
    if s.chars().any(|c| CURRENCY_SYMBOLS.contains(&c)) {
        return true;
    }
    if s.to_uppercase().contains(&suffix.to_uppercase()) {
        return true;
    }
    // ISO-style code at either end, e.g. "CLP 1.000" or "1.000 CLP".
    let is_code = |token: &str| token.len() == 3 && token.chars().all(|c| c.is_ascii_uppercase());
    let mut tokens = s.split_whitespace();
    let first = tokens.next();
    let last = tokens.last().or(first);
    first.is_some_and(is_code) || last.is_some_and(is_code)
}

/// `"{start} to {end}"`, each side falling back to the placeholder.
pub fn format_period(start: &FieldValue, end: &FieldValue) -> String {
    format!("{} to {}", start.display(), end.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUT: &str = "%d/%m/%Y";

    #[test]
    fn known_date_patterns_are_reformatted() {
        assert_eq!(reformat_date("2024-01-05", OUT), "05/01/2024");
        assert_eq!(reformat_date("2024-01-05T10:30:00", OUT), "05/01/2024");
        assert_eq!(reformat_date("2024-01-05T10:30:00.123", OUT), "05/01/2024");
        assert_eq!(reformat_date("2024-01-05T10:30:00Z", OUT), "05/01/2024");
        assert_eq!(reformat_date("2024-01-05 10:30:00", OUT), "05/01/2024");
        assert_eq!(reformat_date("05-01-2024", OUT), "05/01/2024");
        assert_eq!(reformat_date("2024/01/05", OUT), "05/01/2024");
        assert_eq!(reformat_date("05/01/2024", OUT), "05/01/2024");
    }

    #[test]
    fn unknown_dates_pass_through() {
        assert_eq!(reformat_date("yesterday", OUT), "yesterday");
        assert_eq!(reformat_date("2024-13-45", OUT), "2024-13-45");
        assert_eq!(format_date(&FieldValue::Missing, OUT), "N/A");
        assert_eq!(format_date(&FieldValue::from(20240105), OUT), "20240105");
    }

    #[test]
    fn output_format_is_validated() {
        assert!(is_valid_date_format("%d/%m/%Y"));
        assert!(is_valid_date_format("%Y-%m-%d"));
        assert!(!is_valid_date_format("%Q"));
        assert!(!is_valid_date_format(""));
    }

    #[test]
    fn money_gets_a_suffix_once() {
        assert_eq!(format_money(&FieldValue::from("1000"), "USD"), "1000 USD");
        assert_eq!(format_money(&FieldValue::from(1000), "USD"), "1000 USD");
        assert_eq!(format_money(&FieldValue::from("1000 USD"), "USD"), "1000 USD");
        assert_eq!(format_money(&FieldValue::from("1000 usd"), "USD"), "1000 usd");
        assert_eq!(format_money(&FieldValue::from("$1,000"), "USD"), "$1,000");
        assert_eq!(format_money(&FieldValue::from("CLP 1.000"), "USD"), "CLP 1.000");
        assert_eq!(format_money(&FieldValue::from("1.000 CLP"), "USD"), "1.000 CLP");
        assert_eq!(format_money(&FieldValue::Missing, "USD"), "N/A");
        assert_eq!(format_money(&FieldValue::from("1000"), ""), "1000");
    }

    #[test]
    fn period_defaults_each_side() {
        let start = FieldValue::from("2024-01-01");
        assert_eq!(format_period(&start, &FieldValue::from("2024-01-31")), "2024-01-01 to 2024-01-31");
        assert_eq!(format_period(&start, &FieldValue::Missing), "2024-01-01 to N/A");
    }
}
