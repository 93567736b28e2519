use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

/// Reads a raw field as an integer, the way QuickBooks ids and rates are
/// loosely typed: JSON numbers and numeric strings both qualify, fractional
/// values are truncated toward zero. Anything else is `None`.
#[must_use]
pub fn lenient_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    }
}

/// Reads a raw field as an exact decimal. Amounts arrive as JSON numbers,
/// occasionally as strings.
#[must_use]
pub fn lenient_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up, so the upper bound is exclusive
    (value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64)
        .then(|| value.trunc() as i64)
}
