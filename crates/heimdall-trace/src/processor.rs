//! Span processor trait and built-in processors.
//!
//! Processors observe every span at start and at end. The batch pipeline,
//! the debug console exporter, and any caller-supplied processor all hang
//! off the provider through this trait.

use std::sync::Mutex;

use crate::span::SpanData;

/// Observes spans as they start and finish.
///
/// `on_start` runs synchronously inside `start_span`, after enrichment, so
/// a processor always sees a fully enriched span. `on_end` receives the
/// finished record by value.
pub trait SpanProcessor: Send + Sync {
    /// Called when a span starts. The span may be inspected or mutated.
    fn on_start(&self, span: &mut SpanData);

    /// Called when a span finishes.
    fn on_end(&self, span: SpanData);

    /// Flush any buffered spans. Must have *requested* export for every
    /// buffered span before returning.
    fn force_flush(&self) {}

    /// Flush and release resources. The processor receives no spans after
    /// this returns.
    fn shutdown(&self) {}
}

/// Shared handle to a span processor.
pub type SharedProcessor = std::sync::Arc<dyn SpanProcessor>;

/// Debug exporter: logs finished spans through `tracing`.
///
/// Attached by the lifecycle controller when debug mode is enabled.
#[derive(Debug, Default)]
pub struct ConsoleProcessor;

impl SpanProcessor for ConsoleProcessor {
    fn on_start(&self, _span: &mut SpanData) {}

    fn on_end(&self, span: SpanData) {
        tracing::debug!(
            name = %span.name,
            scope = %span.scope,
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            duration_us = span.duration_micros(),
            attributes = %serde_json::to_string(&span.attributes).unwrap_or_default(),
            "span finished"
        );
    }
}

/// Test double that records every span it observes.
#[derive(Debug, Default)]
pub struct RecordingProcessor {
    started: Mutex<Vec<SpanData>>,
    ended: Mutex<Vec<SpanData>>,
}

impl RecordingProcessor {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans observed at start time (snapshot taken in `on_start`).
    pub fn started(&self) -> Vec<SpanData> {
        self.started.lock().unwrap().clone()
    }

    /// Finished spans in completion order.
    pub fn ended(&self) -> Vec<SpanData> {
        self.ended.lock().unwrap().clone()
    }
}

impl SpanProcessor for RecordingProcessor {
    fn on_start(&self, span: &mut SpanData) {
        self.started.lock().unwrap().push(span.clone());
    }

    fn on_end(&self, span: SpanData) {
        self.ended.lock().unwrap().push(span);
    }
}
