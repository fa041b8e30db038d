//! Stored values and their coercion into the scalar types callers ask for.
//!
//! Backends hold [`Value`]s (`toml::Value`). A typed getter converts a stored
//! value through [`FromValue`]. Coercion is lenient in the same way config
//! sources usually are: a string `"8080"` reads as an integer, `1` reads as
//! `true`, an RFC 3339 string reads as a time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

pub use toml::Value;

/// Conversion from a stored [`Value`]. The error is a human-readable reason.
pub trait FromValue: Sized {
    const TYPE_NAME: &'static str;

    fn from_value(value: Value) -> Result<Self, String>;
}

fn mismatch<T: FromValue>(value: &Value) -> String {
    format!("cannot read {} as {}", value.type_str(), T::TYPE_NAME)
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Boolean(b) => Ok(b.to_string()),
            Value::Datetime(d) => Ok(d.to_string()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Boolean(b) => Ok(b),
            Value::Integer(i) => Ok(i != 0),
            Value::String(s) => parse_bool(&s).ok_or_else(|| format!("'{s}' is not a bool")),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl FromValue for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Integer(i) => Ok(i),
            Value::Float(f) if f.fract() == 0.0 => whole_float(f),
            Value::Boolean(b) => Ok(i64::from(b)),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| format!("'{s}' is not an integer")),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

/// `f` as an integer, when it fits. `i64::MAX as f64` rounds up to 2^63.
fn whole_float(f: f64) -> Result<i64, String> {
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err(format!("{f} is out of integer range"))
    }
}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "float";

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            Value::String(s) => s.trim().parse().map_err(|_| format!("'{s}' is not a float")),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for Vec<u8> {
    const TYPE_NAME: &'static str = "bytes";

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s.into_bytes()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Integer(i) => u8::try_from(i).map_err(|_| format!("{i} is not a byte")),
                    other => Err(mismatch::<Self>(&other)),
                })
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    const TYPE_NAME: &'static str = "time";

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Datetime(d) => parse_time(&d.to_string()),
            Value::String(s) => parse_time(s.trim()),
            Value::Integer(secs) => Utc
                .timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| format!("{secs} is out of range for a timestamp")),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for Value {
    const TYPE_NAME: &'static str = "value";

    fn from_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

/// RFC 3339 first, then offset-less date-times and bare dates as UTC.
fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        && let Some(naive) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(naive.and_utc());
    }
    Err(format!("'{s}' is not a time"))
}

/// Store a time as a TOML datetime with a UTC offset.
pub fn time_value(time: DateTime<Utc>) -> Value {
    let text = time.to_rfc3339_opts(SecondsFormat::AutoSi, true);
    match text.parse::<toml::value::Datetime>() {
        Ok(d) => Value::Datetime(d),
        Err(_) => Value::String(text),
    }
}
