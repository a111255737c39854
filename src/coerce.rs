// Helpers turning loosely-typed advert values and user input into comparison keys

use crate::models::Loose;

// Blank or absent input means "no value". Anything that does not parse to a finite
// number is treated the same way, so a typo in a filter bound never hides every record.
pub fn to_optional_number(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

// Filter bounds are kept as the raw text the user typed
pub fn parse_bound(raw: &str) -> Option<f64> {
    to_optional_number(Some(raw))
}

// Numeric view of a record field. Text that holds a number counts as that number.
pub fn numeric_value(value: Option<&Loose>) -> Option<f64> {
    match value? {
        Loose::Number(n) if n.is_finite() => Some(*n),
        Loose::Number(_) => None,
        Loose::Text(s) => to_optional_number(Some(s)),
        Loose::Other(_) => None,
    }
}

// Text view of a record field for comparison: whitespace-only text counts as missing
pub fn comparable_text(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

// Renders a number the way it would appear in JSON, without a trailing ".0" for integers
pub fn number_to_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
