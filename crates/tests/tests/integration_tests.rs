use config::Config;
use exporter::Exporter;
use mapper::otlp::common::v1::any_value::Value;
use mapper::{decode, summarize, PROJECT_NAME_KEY};
use serde_json::json;
use tests::{CollectorBehavior, MockCollector};

/// Decode a multi-resource export and forward it, then check what the
/// collector saw on the wire.
#[tokio::test]
async fn test_decode_and_export_pipeline() {
    let input = json!({
        "resourceSpans": [
            {
                "resource": {"attributes": [
                    {"key": "service.name", "value": {"stringValue": "claude-code"}}
                ]},
                "scopeSpans": [{"spans": [
                    {
                        "traceId": "0af7651916cd43dd8448eb211c80319c",
                        "spanId": "b7ad6b7169203331",
                        "name": "session",
                        "kind": 2,
                        "startTimeUnixNano": "1700000000000000000",
                        "endTimeUnixNano": "1700000001000000000",
                        "attributes": [
                            {"key": "tokens", "value": {"intValue": "1200"}},
                            {"key": "cost", "value": {"doubleValue": 0.25}},
                            {"key": "cached", "value": {"boolValue": true}}
                        ]
                    },
                    {
                        "traceId": "0af7651916cd43dd8448eb211c80319c",
                        "spanId": "00f067aa0ba902b7",
                        "parentSpanId": "b7ad6b7169203331",
                        "name": "tool"
                    }
                ]}]
            },
            {"scopeSpans": [{"spans": [{}]}]}
        ]
    })
    .to_string();

    let export = decode(input.as_bytes(), "pipeline").expect("Failed to decode export");
    let summary = summarize(&export);
    assert_eq!(summary.resource_spans, 2);
    assert_eq!(summary.spans, 3);

    let collector = MockCollector::start(CollectorBehavior::Accept)
        .await
        .expect("Failed to start mock collector");

    let config = Config {
        api_key: "key".to_string(),
        space_id: "space".to_string(),
        project_name: "pipeline".to_string(),
        otlp_endpoint: collector.endpoint(),
        export_timeout_secs: 5,
    };
    Exporter::new(&config)
        .export(export.clone())
        .await
        .expect("Export should succeed");

    let received = collector.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].request, export);

    let request = &received[0].request;
    for rs in &request.resource_spans {
        let resource = rs.resource.as_ref().expect("Resource should be set");
        assert_eq!(resource.attributes[0].key, PROJECT_NAME_KEY);
        for span in rs.scope_spans.iter().flat_map(|ss| &ss.spans) {
            assert_eq!(span.attributes[0].key, PROJECT_NAME_KEY);
            assert_eq!(span.trace_id.len(), 16);
            assert_eq!(span.span_id.len(), 8);
        }
    }

    let session = &request.resource_spans[0].scope_spans[0].spans[0];
    let values: Vec<&Value> = session
        .attributes
        .iter()
        .skip(1)
        .filter_map(|kv| kv.value.as_ref()?.value.as_ref())
        .collect();
    assert_eq!(values, vec![&Value::IntValue(1200), &Value::DoubleValue(0.25)]);

    let tool = &request.resource_spans[0].scope_spans[0].spans[1];
    assert_eq!(tool.parent_span_id, session.span_id);

    collector.stop().await;
}
