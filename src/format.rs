// Display formatting for advert cells

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::{coerce::numeric_value, models::Loose};

pub const PLACEHOLDER: &str = "—";

pub fn text_or_placeholder(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

// Accepts RFC 3339, or a date-time / date without offset (read as UTC)
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `YYYY-MM-DD HH:MM` in the display timezone.
pub fn format_timestamp(raw: Option<&str>, tz: Tz) -> String {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

// Rounded to a whole number with "," grouping
fn group_thousands(n: f64) -> String {
    let rounded = n.round();
    // Whole-number f64 formatting, no integer cast that could saturate
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn format_number(value: Option<&Loose>) -> String {
    numeric_value(value)
        .map(group_thousands)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Tooltip for a percentile column: how far the minimum price sits above it.
/// Empty when either side is not a number.
pub fn diff_tooltip(label: &str, min_price: Option<&Loose>, below: Option<&Loose>) -> String {
    match (numeric_value(min_price), numeric_value(below)) {
        (Some(min), Some(below)) => format!("{}: {} €", label, group_thousands(min - below)),
        _ => String::new(),
    }
}

// Asking price at or under the market minimum
pub fn is_bargain(diff: Option<&Loose>) -> bool {
    numeric_value(diff).is_some_and(|d| d <= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_in_lisbon_time() {
        let tz: Tz = "Europe/Lisbon".parse().unwrap();
        // Summer time, UTC+1
        assert_eq!(format_timestamp(Some("2024-07-01T10:30:00Z"), tz), "2024-07-01 11:30");
        // Winter time, UTC+0
        assert_eq!(format_timestamp(Some("2024-01-15T23:05:00+00:00"), tz), "2024-01-15 23:05");
        assert_eq!(format_timestamp(Some("2024-01-15T23:05:00.123"), tz), "2024-01-15 23:05");
        assert_eq!(format_timestamp(Some("2024-01-15"), tz), "2024-01-15 00:00");
        assert_eq!(format_timestamp(Some("yesterday"), tz), PLACEHOLDER);
        assert_eq!(format_timestamp(None, tz), PLACEHOLDER);
    }

    #[test]
    fn numbers_are_rounded_and_grouped() {
        assert_eq!(format_number(Some(&Loose::Number(1234567.5))), "1,234,568");
        assert_eq!(format_number(Some(&Loose::Number(999.4))), "999");
        assert_eq!(format_number(Some(&Loose::Number(-1500.0))), "-1,500");
        assert_eq!(format_number(Some(&Loose::Text("12000".into()))), "12,000");
        assert_eq!(format_number(Some(&Loose::Text("".into()))), PLACEHOLDER);
        assert_eq!(format_number(None), PLACEHOLDER);
    }

    #[test]
    fn huge_numbers_keep_every_digit() {
        let text = format_number(Some(&Loose::Number(1e40)));
        assert!(text.starts_with("10,000,000,000,000,000,"));
        assert_eq!(text.replace(',', "").len(), 41);
        assert_eq!(format_number(Some(&Loose::Number(-0.4))), "0");
    }

    #[test]
    fn tooltip_needs_both_numbers() {
        let min = Loose::Number(10000.0);
        let below = Loose::Number(8500.0);
        assert_eq!(diff_tooltip("Net", Some(&min), Some(&below)), "Net: 1,500 €");
        assert_eq!(diff_tooltip("Net", Some(&min), None), "");
    }

    #[test]
    fn bargain_at_or_under_zero() {
        assert!(is_bargain(Some(&Loose::Number(0.0))));
        assert!(is_bargain(Some(&Loose::Number(-10.0))));
        assert!(!is_bargain(Some(&Loose::Number(1.0))));
        assert!(!is_bargain(None));
    }

    #[test]
    fn placeholders_for_missing_text() {
        assert_eq!(text_or_placeholder(Some("VW")), "VW");
        assert_eq!(text_or_placeholder(Some("")), PLACEHOLDER);
        assert_eq!(text_or_placeholder(None), PLACEHOLDER);
    }
}
