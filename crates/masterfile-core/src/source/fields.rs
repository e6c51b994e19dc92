use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static RATING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("rating pattern is valid"));

static AIRPORT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\w+)\)").expect("airport pattern is valid"));

/// Scalar fields that exports write as either strings, numbers or booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            Self::Flag(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn is_true(&self) -> bool {
        match self {
            Self::Flag(b) => *b,
            Self::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Self::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        }
    }

    /// Pulls the first decimal out of strings like `Rating: 3.5 out of 5.0`.
    pub fn as_rating(&self) -> Option<f64> {
        match self {
            Self::Flag(_) => None,
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => RATING.find(s).and_then(|m| m.as_str().parse().ok()),
        }
    }
}

/// `*_json` columns arrive either as inline JSON or as JSON encoded in a string.
/// Anything that is not an object or array after decoding is dropped.
pub fn decode_json(value: Option<&Value>) -> Option<Value> {
    let decoded = match value? {
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
        other => other.clone(),
    };

    match decoded {
        Value::Object(ref map) if !map.is_empty() => Some(decoded),
        Value::Array(ref items) if !items.is_empty() => Some(decoded),
        _ => None,
    }
}

pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

/// Splits `Jacksonville, Florida, United States, 32256` positionally.
pub fn split_locality(line: Option<&str>) -> AddressParts {
    let Some(line) = line else {
        return AddressParts::default();
    };

    let mut parts = line.split(',').map(|p| non_empty(Some(p)));

    AddressParts {
        city: parts.next().flatten(),
        state: parts.next().flatten(),
        country: parts.next().flatten(),
        postal_code: parts.next().flatten(),
    }
}

/// The `(CODE)` of the first entry in an airport list.
pub fn primary_airport_code(airports: Option<&Value>) -> Option<String> {
    let airports = decode_json(airports)?;
    let first = airports.as_array()?.first()?;
    let label = first.get("airport")?.as_str()?;

    AIRPORT_CODE
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Accepts RFC 3339 as well as the naive ISO forms the scrapers emit, which
/// are taken to be UTC.
pub fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Keeps digits, `+`, spaces, dashes and parentheses.
pub fn normalize_phone(value: Option<&str>) -> Option<String> {
    let cleaned: String = non_empty(value)?
        .chars()
        .filter(|c| c.is_ascii_digit() || "+ -()".contains(*c))
        .collect();

    non_empty(Some(&cleaned))
}
