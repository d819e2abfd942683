//! Serde schema for the OTLP/JSON trace export encoding
//!
//! Only the fields that are forwarded are modeled. Unknown fields are
//! ignored, and every optional field is an `Option` so that the defaults
//! applied during conversion stay explicit.
//!
//! Span and attribute fields are read with [`lenient`]: a value of the wrong
//! JSON type becomes `None` instead of failing the whole document.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::fmt;

/// Deserialize `T`, mapping a type mismatch to `None`
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

fn empty_key() -> Option<String> {
    Some(String::new())
}

/// Top-level `ExportTraceServiceRequest` document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceExportJson {
    #[serde(default)]
    pub resource_spans: Vec<ResourceSpansJson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpansJson {
    #[serde(default)]
    pub resource: Option<ResourceJson>,

    #[serde(default)]
    pub scope_spans: Vec<ScopeSpansJson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceJson {
    #[serde(default)]
    pub attributes: Vec<KeyValueJson>,
}

/// Spans of one instrumentation scope; the scope itself is not modeled
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeSpansJson {
    #[serde(default)]
    pub spans: Vec<SpanJson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanJson {
    /// 32 hex characters
    pub trace_id: Option<String>,

    /// 16 hex characters
    pub span_id: Option<String>,

    /// 16 hex characters, or empty for a root span
    pub parent_span_id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub kind: Option<i32>,

    #[serde(default, deserialize_with = "lenient")]
    pub start_time_unix_nano: Option<JsonNumber>,

    #[serde(default, deserialize_with = "lenient")]
    pub end_time_unix_nano: Option<JsonNumber>,

    #[serde(default)]
    pub attributes: Vec<KeyValueJson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyValueJson {
    /// Absent keys are empty; a key of any other JSON type is `None` and the
    /// attribute is dropped
    #[serde(default = "empty_key", deserialize_with = "lenient")]
    pub key: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<AnyValueJson>,
}

/// Type-tagged attribute value
///
/// Variants other than string, int and double (`boolValue`, `arrayValue`,
/// `kvlistValue`, `bytesValue`) are accepted by the schema but never read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnyValueJson {
    #[serde(default, deserialize_with = "lenient")]
    pub string_value: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub int_value: Option<JsonNumber>,

    #[serde(default, deserialize_with = "lenient")]
    pub double_value: Option<JsonNumber>,
}

/// A numeric field that OTLP/JSON may carry either as a JSON number or as a
/// decimal string (64-bit integers are strings in the canonical encoding).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum JsonNumber {
    Number(serde_json::Number),
    Text(String),
}

impl JsonNumber {
    /// Integers, integral floats such as `3.0`, or decimal strings
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            JsonNumber::Number(n) => n
                .as_i64()
                .or_else(|| integral(n, i64::MIN as f64, i64::MAX as f64).map(|f| f as i64)),
            JsonNumber::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Unsigned integers, integral floats such as `1.7e18`, or decimal strings
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            JsonNumber::Number(n) => n
                .as_u64()
                .or_else(|| integral(n, 0.0, u64::MAX as f64).map(|f| f as u64)),
            JsonNumber::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonNumber::Number(n) => n.as_f64(),
            JsonNumber::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn integral(n: &serde_json::Number, min: f64, max: f64) -> Option<f64> {
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= min && *f <= max)
}

impl fmt::Display for JsonNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonNumber::Number(n) => write!(f, "{}", n),
            JsonNumber::Text(s) => f.write_str(s),
        }
    }
}
