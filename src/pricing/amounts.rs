//! Amount parsing for generated recipes
//!
//! Generated ingredient lists mix numbers (`200`) with text (`"200g"`,
//! `"1/2 cup"`). Only the leading quantity is kept; the unit is dropped because
//! quantities are unit-less everywhere else.

use serde_json::Value;

/// Extract a non-negative quantity from a JSON amount
pub fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_leading_quantity(s)?,
        _ => return None,
    };

    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

/// Parse the number at the start of a string: "200g" -> 200, "1.5 cups" -> 1.5,
/// "1/2 tsp" -> 0.5
pub fn parse_leading_quantity(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '/'))
        .unwrap_or(trimmed.len());
    let number = &trimmed[..end];

    if number.is_empty() {
        return None;
    }

    match number.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            Some(num / den)
        }
        None => number.parse().ok(),
    }
}
