//! Zipkin-style JSON span encoding.
//!
//! Batches are encoded as a flat JSON array of span objects with microsecond
//! timestamps and flat string tags, the format the collector endpoint
//! accepts. This is the wire boundary: nothing upstream of the exporter
//! knows about it.

use heimdall_trace::{SpanData, SpanKind, SpanStatus};
use serde_json::{Map, Value as JsonValue};

/// Encodes finished spans into Zipkin-style JSON.
#[derive(Debug, Clone)]
pub struct ZipkinEncoder {
    /// Reported as `localEndpoint.serviceName` on every span.
    service_name: String,
}

impl ZipkinEncoder {
    /// Create an encoder reporting the given service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Encode a batch as a JSON array.
    pub fn encode_batch(&self, batch: &[SpanData]) -> JsonValue {
        JsonValue::Array(batch.iter().map(|span| self.encode_span(span)).collect())
    }

    fn encode_span(&self, span: &SpanData) -> JsonValue {
        let timestamp_us = span.started_at.timestamp_micros().max(0);

        let mut tags = Map::new();
        for (key, value) in &span.attributes {
            tags.insert(key.clone(), JsonValue::String(value.to_string()));
        }
        match &span.status {
            SpanStatus::Unset => {}
            SpanStatus::Ok => {
                tags.insert("ot.status_code".to_string(), JsonValue::String("OK".to_string()));
            }
            SpanStatus::Error { message } => {
                tags.insert("error".to_string(), JsonValue::String("true".to_string()));
                tags.insert(
                    "ot.status_description".to_string(),
                    JsonValue::String(message.clone()),
                );
            }
        }

        let mut object = Map::new();
        object.insert("traceId".to_string(), JsonValue::String(span.trace_id.clone()));
        object.insert("id".to_string(), JsonValue::String(span.span_id.clone()));
        if let Some(parent) = &span.parent_span_id {
            object.insert("parentId".to_string(), JsonValue::String(parent.clone()));
        }
        object.insert("name".to_string(), JsonValue::String(span.name.clone()));
        if let Some(kind) = kind_str(span.kind) {
            object.insert("kind".to_string(), JsonValue::String(kind.to_string()));
        }
        object.insert("timestamp".to_string(), JsonValue::from(timestamp_us));
        object.insert(
            "duration".to_string(),
            JsonValue::from(span.duration_micros()),
        );
        object.insert(
            "localEndpoint".to_string(),
            serde_json::json!({ "serviceName": self.service_name }),
        );
        object.insert("tags".to_string(), JsonValue::Object(tags));

        JsonValue::Object(object)
    }
}

/// Zipkin has no INTERNAL kind; internal spans omit the field.
fn kind_str(kind: SpanKind) -> Option<&'static str> {
    match kind {
        SpanKind::Internal => None,
        SpanKind::Client => Some("CLIENT"),
        SpanKind::Server => Some("SERVER"),
        SpanKind::Producer => Some("PRODUCER"),
        SpanKind::Consumer => Some("CONSUMER"),
    }
}
