//! Span data model.
//!
//! Spans are flat records: a name, start/end timestamps, a scalar attribute
//! map, and a status. Producers build them through a [`SpanBuilder`]; the
//! pipeline only ever sees finished [`SpanData`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A scalar attribute value.
///
/// Attribute maps are string-keyed and last-write-wins: inserting a key that
/// already exists replaces the previous value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<u16> for AttrValue {
    fn from(v: u16) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::String(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::String(v)
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::String(v) => write!(f, "{}", v),
        }
    }
}

/// Attribute map attached to a span. Keys are unique, last write wins.
pub type AttrMap = HashMap<String, AttrValue>;

/// Outcome of a span.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum SpanStatus {
    /// No explicit status was recorded.
    #[default]
    #[serde(rename = "unset")]
    Unset,

    /// The operation completed successfully.
    #[serde(rename = "ok")]
    Ok,

    /// The operation failed.
    #[serde(rename = "error")]
    Error { message: String },
}

/// Role of the span relative to the operation it describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    /// Work local to the page (document load, long task, interaction).
    #[default]
    Internal,
    /// Outbound request (XHR, fetch, web socket).
    Client,
    /// Message production (rarely used client-side).
    Producer,
    /// Message consumption.
    Consumer,
    /// Inbound request handling (not produced by this agent).
    Server,
}

/// A finished (or in-flight) span record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanData {
    /// 32-hex trace identifier.
    pub trace_id: String,

    /// 16-hex span identifier.
    pub span_id: String,

    /// Parent span identifier, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,

    /// Name of the instrumentation scope that produced the span.
    pub scope: String,

    /// Human-readable operation name (e.g. "documentLoad", "GET").
    pub name: String,

    /// Span kind.
    #[serde(default)]
    pub kind: SpanKind,

    /// When the operation started.
    pub started_at: DateTime<Utc>,

    /// When the operation completed. `None` while in flight.
    pub ended_at: Option<DateTime<Utc>>,

    /// Attributes. Keys are unique, last write wins.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: AttrMap,

    /// Outcome.
    #[serde(default)]
    pub status: SpanStatus,
}

impl SpanData {
    /// Set an attribute, replacing any previous value for the key.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Span duration in microseconds, zero while in flight.
    pub fn duration_micros(&self) -> u64 {
        match self.ended_at {
            Some(ended) => (ended - self.started_at).num_microseconds().unwrap_or(0).max(0) as u64,
            None => 0,
        }
    }
}

/// Generate a fresh 32-hex trace identifier.
pub fn new_trace_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Generate a fresh 16-hex span identifier.
pub fn new_span_id() -> String {
    let full = uuid::Uuid::new_v4().simple().to_string();
    full[..16].to_string()
}

/// Builder for starting a span through a tracer.
#[derive(Debug, Clone)]
pub struct SpanBuilder {
    /// Operation name.
    pub name: String,
    /// Span kind.
    pub kind: SpanKind,
    /// Initial attributes (enrichment is applied on top of these).
    pub attributes: AttrMap,
    /// Explicit start time; defaults to now at `start_span`.
    pub started_at: Option<DateTime<Utc>>,
    /// Parent span identifier, if the producer tracks one.
    pub parent_span_id: Option<String>,
}

impl SpanBuilder {
    /// Create a builder for the given operation name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SpanKind::Internal,
            attributes: AttrMap::new(),
            started_at: None,
            parent_span_id: None,
        }
    }

    /// Set the span kind.
    pub fn with_kind(mut self, kind: SpanKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add an initial attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Use an explicit start time instead of now.
    pub fn with_start(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    /// Link the span to a parent.
    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }
}
