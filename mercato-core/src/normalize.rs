//! Lenient readers for provider JSON.
//!
//! Providers disagree on whether numbers are numbers, strings, or strings with a
//! trailing `%`. These helpers read what is there and default to zero or `None`
//! instead of failing, so one odd field never discards a whole quote.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

/// Parse a decimal from a JSON number or numeric string (`"1.23%"`, `"1,234.5"`).
#[must_use]
pub fn decimal_opt(v: Option<&Value>) -> Option<Decimal> {
    match v? {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('%')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            if cleaned.is_empty() || cleaned == "None" || cleaned == "-" {
                return None;
            }
            Decimal::from_str(&cleaned)
                .or_else(|_| Decimal::from_scientific(&cleaned))
                .ok()
        }
        _ => None,
    }
}

/// Like [`decimal_opt`] but defaults to zero.
#[must_use]
pub fn decimal_or_zero(v: Option<&Value>) -> Decimal {
    decimal_opt(v).unwrap_or(Decimal::ZERO)
}

/// Read a non-negative integer, rounding floats and parsing strings. Defaults to zero.
#[must_use]
pub fn u64_or_zero(v: Option<&Value>) -> u64 {
    match v {
        Some(n @ (Value::Number(_) | Value::String(_))) => decimal_opt(Some(n))
            .filter(|d| d.is_sign_positive())
            .and_then(|d| u64::try_from(d.round()).ok())
            .unwrap_or(0),
        _ => 0,
    }
}

/// Read a trimmed, non-empty string.
#[must_use]
pub fn string_opt(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a string, defaulting to empty.
#[must_use]
pub fn string_or_empty(v: Option<&Value>) -> String {
    string_opt(v).unwrap_or_default()
}

/// Interpret a number as unix seconds, or milliseconds when it is too large to be seconds.
#[must_use]
pub fn unix_timestamp(v: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = match v? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    if raw <= 0 {
        return None;
    }
    // 1e11 seconds is the year 5138; anything above is milliseconds
    if raw > 100_000_000_000 {
        Utc.timestamp_millis_opt(raw).single()
    } else {
        Utc.timestamp_opt(raw, 0).single()
    }
}

/// Parse RFC 3339 timestamps, `YYYY-MM-DD HH:MM:SS` (assumed UTC), or bare dates.
#[must_use]
pub fn datetime_opt(v: Option<&Value>) -> Option<DateTime<Utc>> {
    let s = v?.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// True when a price is missing or zero; providers use zero as "no data".
#[must_use]
pub fn is_sentinel_price(price: Option<Decimal>) -> bool {
    price.is_none_or(|p| p.is_zero())
}

/// Uppercase and trim a ticker.
#[must_use]
pub fn canonical_symbol(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Whether `raw` looks like a ticker rather than free text.
///
/// Accepts 1–12 characters of letters, digits, and the punctuation used by
/// share classes and index or FX tickers (`.`, `-`, `^`, `=`).
#[must_use]
pub fn is_symbol_shaped(raw: &str) -> bool {
    let s = raw.trim();
    !s.is_empty()
        && s.len() <= 12
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
}
