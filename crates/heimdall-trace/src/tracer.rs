//! Tracer and provider seams plus the SDK implementation.
//!
//! Producers only ever see the [`Tracer`] trait; the lifecycle controller
//! wires providers together through [`TracerProvider`]. Decorators (the
//! span enricher) wrap either trait without touching this module.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use crate::processor::SharedProcessor;
use crate::span::{AttrValue, SpanBuilder, SpanData, SpanStatus, new_span_id, new_trace_id};

/// Starts spans for one instrumentation scope.
pub trait Tracer: Send + Sync {
    /// Start a span from a builder. Enrichment and `on_start` processing
    /// run synchronously before the handle is returned.
    fn start_span(&self, builder: SpanBuilder) -> ActiveSpan;
}

/// Hands out tracers and controls the processor pipeline.
pub trait TracerProvider: Send + Sync {
    /// Obtain a tracer for the named instrumentation scope.
    fn tracer(&self, scope: &str) -> Box<dyn Tracer>;

    /// Synchronously request export of everything buffered downstream.
    fn force_flush(&self);

    /// Flush and release all processors. Idempotent.
    fn shutdown(&self);
}

/// Shared handle to a tracer provider.
pub type SharedProvider = Arc<dyn TracerProvider>;

struct ProviderInner {
    processors: Vec<SharedProcessor>,
    is_shutdown: AtomicBool,
}

/// The concrete provider: fans spans out to its processors.
pub struct SdkTracerProvider {
    inner: Arc<ProviderInner>,
}

impl SdkTracerProvider {
    /// Start building a provider.
    pub fn builder() -> SdkProviderBuilder {
        SdkProviderBuilder {
            processors: Vec::new(),
        }
    }
}

/// Builder for [`SdkTracerProvider`].
pub struct SdkProviderBuilder {
    processors: Vec<SharedProcessor>,
}

impl SdkProviderBuilder {
    /// Attach a span processor. Processors run in attachment order.
    pub fn with_processor(mut self, processor: SharedProcessor) -> Self {
        self.processors.push(processor);
        self
    }

    /// Finish the provider.
    pub fn build(self) -> SdkTracerProvider {
        SdkTracerProvider {
            inner: Arc::new(ProviderInner {
                processors: self.processors,
                is_shutdown: AtomicBool::new(false),
            }),
        }
    }
}

impl TracerProvider for SdkTracerProvider {
    fn tracer(&self, scope: &str) -> Box<dyn Tracer> {
        Box::new(SdkTracer {
            scope: scope.to_string(),
            inner: Arc::clone(&self.inner),
        })
    }

    fn force_flush(&self) {
        for processor in &self.inner.processors {
            processor.force_flush();
        }
    }

    fn shutdown(&self) {
        if self.inner.is_shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        for processor in &self.inner.processors {
            processor.shutdown();
        }
        tracing::debug!("tracer provider shut down");
    }
}

struct SdkTracer {
    scope: String,
    inner: Arc<ProviderInner>,
}

impl Tracer for SdkTracer {
    fn start_span(&self, builder: SpanBuilder) -> ActiveSpan {
        let mut data = SpanData {
            trace_id: new_trace_id(),
            span_id: new_span_id(),
            parent_span_id: builder.parent_span_id,
            scope: self.scope.clone(),
            name: builder.name,
            kind: builder.kind,
            started_at: builder.started_at.unwrap_or_else(Utc::now),
            ended_at: None,
            attributes: builder.attributes,
            status: SpanStatus::Unset,
        };

        if !self.inner.is_shutdown.load(Ordering::SeqCst) {
            for processor in &self.inner.processors {
                processor.on_start(&mut data);
            }
        }

        ActiveSpan {
            data: Some(data),
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Handle to an in-flight span.
///
/// Ends automatically on drop if not ended explicitly, so a producer that
/// returns early never leaks an open span.
pub struct ActiveSpan {
    data: Option<SpanData>,
    inner: Arc<ProviderInner>,
}

impl ActiveSpan {
    /// The span's trace identifier.
    pub fn trace_id(&self) -> &str {
        self.data.as_ref().map(|d| d.trace_id.as_str()).unwrap_or("")
    }

    /// The span's identifier (usable as a parent for child spans).
    pub fn span_id(&self) -> &str {
        self.data.as_ref().map(|d| d.span_id.as_str()).unwrap_or("")
    }

    /// Set an attribute on the in-flight span.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        if let Some(data) = self.data.as_mut() {
            data.set_attribute(key, value);
        }
    }

    /// Set the span status.
    pub fn set_status(&mut self, status: SpanStatus) {
        if let Some(data) = self.data.as_mut() {
            data.status = status;
        }
    }

    /// End the span now.
    pub fn end(mut self) {
        self.finish(Utc::now());
    }

    /// End the span at an explicit timestamp (historical timings).
    pub fn end_at(mut self, ended_at: DateTime<Utc>) {
        self.finish(ended_at);
    }

    fn finish(&mut self, ended_at: DateTime<Utc>) {
        let Some(mut data) = self.data.take() else {
            return;
        };
        data.ended_at = Some(ended_at);

        if self.inner.is_shutdown.load(Ordering::SeqCst) {
            return;
        }
        for processor in &self.inner.processors {
            processor.on_end(data.clone());
        }
    }
}

impl Drop for ActiveSpan {
    fn drop(&mut self) {
        if self.data.is_some() {
            self.finish(Utc::now());
        }
    }
}
