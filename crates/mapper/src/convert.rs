//! Conversion from the OTLP/JSON schema into OTLP protobuf types
//!
//! Every resource and span gets an `arize.project.name` attribute prepended,
//! whether or not the input already carries one.

use crate::error::{DecodeError, Result};
use crate::json::{
    AnyValueJson, JsonNumber, KeyValueJson, ResourceSpansJson, ScopeSpansJson, SpanJson,
    TraceExportJson,
};
use crate::otlp::{
    collector::trace::v1::ExportTraceServiceRequest,
    common::v1::{any_value, AnyValue, KeyValue},
    resource::v1::Resource,
    trace::v1::{span::SpanKind, status::StatusCode, ResourceSpans, ScopeSpans, Span, Status},
};

/// The protobuf request sent to the collector
pub type TraceExport = ExportTraceServiceRequest;

/// Attribute key identifying the Arize project
pub const PROJECT_NAME_KEY: &str = "arize.project.name";

pub const DEFAULT_SPAN_NAME: &str = "span";
pub const DEFAULT_SPAN_KIND: SpanKind = SpanKind::Internal;

pub const TRACE_ID_LEN: usize = 16;
pub const SPAN_ID_LEN: usize = 8;

/// Parse an OTLP/JSON document and map it into a [`TraceExport`]
pub fn decode(input: &[u8], project_name: &str) -> Result<TraceExport> {
    let export: TraceExportJson = serde_json::from_slice(input)?;
    map_trace_export(&export, project_name)
}

/// Map an already parsed export into a [`TraceExport`]
///
/// Deterministic: the same input and project name always yield the same
/// request.
pub fn map_trace_export(export: &TraceExportJson, project_name: &str) -> Result<TraceExport> {
    let resource_spans = export
        .resource_spans
        .iter()
        .map(|rs| map_resource_spans(rs, project_name))
        .collect::<Result<Vec<_>>>()?;

    Ok(ExportTraceServiceRequest { resource_spans })
}

fn map_resource_spans(rs: &ResourceSpansJson, project_name: &str) -> Result<ResourceSpans> {
    let source_attributes = rs
        .resource
        .as_ref()
        .map(|resource| resource.attributes.as_slice())
        .unwrap_or_default();

    let scope_spans = rs
        .scope_spans
        .iter()
        .map(|ss| map_scope_spans(ss, project_name))
        .collect::<Result<Vec<_>>>()?;

    Ok(ResourceSpans {
        resource: Some(Resource {
            attributes: map_attributes(source_attributes, project_name),
            ..Default::default()
        }),
        scope_spans,
        ..Default::default()
    })
}

fn map_scope_spans(ss: &ScopeSpansJson, project_name: &str) -> Result<ScopeSpans> {
    let spans = ss
        .spans
        .iter()
        .map(|span| map_span(span, project_name))
        .collect::<Result<Vec<_>>>()?;

    Ok(ScopeSpans {
        spans,
        ..Default::default()
    })
}

fn map_span(span: &SpanJson, project_name: &str) -> Result<Span> {
    let trace_id = match span.trace_id.as_deref() {
        Some(value) => decode_id::<TRACE_ID_LEN>("traceId", value)?,
        None => vec![0; TRACE_ID_LEN],
    };

    let span_id = match span.span_id.as_deref() {
        Some(value) => decode_id::<SPAN_ID_LEN>("spanId", value)?,
        None => vec![0; SPAN_ID_LEN],
    };

    // Root spans have no parent
    let parent_span_id = match span.parent_span_id.as_deref() {
        Some(value) if !value.is_empty() => decode_id::<SPAN_ID_LEN>("parentSpanId", value)?,
        _ => Vec::new(),
    };

    Ok(Span {
        trace_id,
        span_id,
        parent_span_id,
        name: span
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_SPAN_NAME.to_string()),
        kind: span.kind.unwrap_or(DEFAULT_SPAN_KIND as i32),
        start_time_unix_nano: decode_timestamp("startTimeUnixNano", span.start_time_unix_nano.as_ref()),
        end_time_unix_nano: decode_timestamp("endTimeUnixNano", span.end_time_unix_nano.as_ref()),
        attributes: map_attributes(&span.attributes, project_name),
        // Input status is never forwarded
        status: Some(Status {
            code: StatusCode::Ok as i32,
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Decode a hex identifier into exactly `N` bytes
fn decode_id<const N: usize>(field: &'static str, value: &str) -> Result<Vec<u8>> {
    let mut bytes = [0u8; N];
    hex::decode_to_slice(value, &mut bytes).map_err(|e| DecodeError::InvalidId {
        field,
        value: value.to_string(),
        reason: format!("{} (expected {} hex characters)", e, N * 2),
    })?;
    Ok(bytes.to_vec())
}

/// Nanoseconds since the epoch, or 0 when absent or not a non-negative integer
fn decode_timestamp(field: &'static str, value: Option<&JsonNumber>) -> u64 {
    let Some(number) = value else {
        return 0;
    };
    number.as_u64().unwrap_or_else(|| {
        tracing::warn!(field, value = %number, "Ignoring unparsable timestamp");
        0
    })
}

fn project_attribute(project_name: &str) -> KeyValue {
    KeyValue {
        key: PROJECT_NAME_KEY.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::StringValue(project_name.to_string())),
        }),
    }
}

/// Project attribute first, then every supported source attribute in order
fn map_attributes(attributes: &[KeyValueJson], project_name: &str) -> Vec<KeyValue> {
    std::iter::once(project_attribute(project_name))
        .chain(attributes.iter().filter_map(map_key_value))
        .collect()
}

fn map_key_value(kv: &KeyValueJson) -> Option<KeyValue> {
    let Some(key) = &kv.key else {
        tracing::debug!("Dropping attribute without a string key");
        return None;
    };
    let Some(value) = kv.value.as_ref().and_then(map_value) else {
        tracing::debug!(%key, "Dropping attribute with unsupported value");
        return None;
    };

    Some(KeyValue {
        key: key.clone(),
        value: Some(AnyValue { value: Some(value) }),
    })
}

/// First present of string, int, double wins. An int or double that does not
/// parse drops the attribute rather than falling through.
fn map_value(value: &AnyValueJson) -> Option<any_value::Value> {
    if let Some(s) = &value.string_value {
        return Some(any_value::Value::StringValue(s.clone()));
    }
    if let Some(n) = &value.int_value {
        return n.as_i64().map(any_value::Value::IntValue);
    }
    if let Some(n) = &value.double_value {
        return n.as_f64().map(any_value::Value::DoubleValue);
    }
    None
}

/// Counts and protobuf size of a mapped export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub resource_spans: usize,
    pub scope_spans: usize,
    pub spans: usize,
    pub encoded_bytes: usize,
}

pub fn summarize(export: &TraceExport) -> ExportSummary {
    let mut summary = ExportSummary {
        resource_spans: export.resource_spans.len(),
        encoded_bytes: prost::Message::encoded_len(export),
        ..Default::default()
    };
    for rs in &export.resource_spans {
        summary.scope_spans += rs.scope_spans.len();
        summary.spans += rs.scope_spans.iter().map(|ss| ss.spans.len()).sum::<usize>();
    }
    summary
}
