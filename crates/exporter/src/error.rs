use std::time::Duration;
use thiserror::Error;
use tonic::metadata::errors::InvalidMetadataValue;

/// Errors raised by a single export attempt
#[derive(Debug, Error)]
pub enum ExportError {
    /// Endpoint URL could not be parsed or configured
    #[error("Invalid collector endpoint {endpoint}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// Channel could not be established
    #[error("Failed to connect to {endpoint}")]
    Connect {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// The call completed with a non-OK gRPC status
    #[error("gRPC error: {} ({:?})", .0.message(), .0.code())]
    Rpc(#[from] tonic::Status),

    /// A credential cannot be sent as a header value
    #[error("Invalid value for {header} metadata")]
    InvalidMetadata {
        header: &'static str,
        #[source]
        source: InvalidMetadataValue,
    },

    /// Connect plus call exceeded the export timeout
    #[error("Export did not complete within {0:?}")]
    Timeout(Duration),
}

/// Result type alias for ExportError
pub type Result<T> = std::result::Result<T, ExportError>;
