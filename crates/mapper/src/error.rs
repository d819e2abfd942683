//! Error types for decoding trace exports

use thiserror::Error;

/// Result type for decoding operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors that abort decoding of a trace export
///
/// Unsupported or mistyped attribute values are not errors; they are dropped.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Input is not valid JSON or does not match the OTLP/JSON schema
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Trace, span or parent span identifier is not hex of the required length
    #[error("Invalid {field} {value:?}: {reason}")]
    InvalidId {
        field: &'static str,
        value: String,
        reason: String,
    },
}
