//! JSON to protobuf mapping for OTLP trace exports
//!
//! The input is the OTLP/JSON encoding of an `ExportTraceServiceRequest`.
//! It is deserialized into the explicit schema in [`json`] and then mapped
//! into the generated protobuf types by [`convert`], injecting the
//! `arize.project.name` attribute on every resource and span.

pub mod otlp {
    //! OpenTelemetry Protocol (OTLP) types generated from protobuf definitions
    pub use opentelemetry_proto::tonic::collector;
    pub use opentelemetry_proto::tonic::common;
    pub use opentelemetry_proto::tonic::resource;
    pub use opentelemetry_proto::tonic::trace;
}

pub mod convert;
pub mod error;
pub mod json;

pub use convert::{
    decode, map_trace_export, summarize, ExportSummary, TraceExport, PROJECT_NAME_KEY,
};
pub use error::{DecodeError, Result};
pub use json::TraceExportJson;
