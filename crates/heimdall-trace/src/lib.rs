//! Tracing core for the Heimdall RUM agent.
//!
//! This crate provides the span pipeline the agent is built around:
//!
//! - **Span model**: flat [`SpanData`] records with scalar attributes
//! - **Tracer seams**: [`Tracer`] / [`TracerProvider`] traits plus the
//!   concrete [`SdkTracerProvider`] that fans spans out to processors
//! - **Enrichment**: [`EnrichedProvider`], a decorator that stamps a fixed
//!   attribute set onto every span at start time
//! - **Batching**: [`BatchProcessor`], a bounded queue with size- and
//!   deadline-triggered flushes and a synchronous `force_flush` for
//!   page-hide delivery
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use heimdall_trace::{
//!     BatchConfig, BatchProcessor, RecordingExporter, SdkTracerProvider,
//!     SpanBuilder, TracerProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let exporter = Arc::new(RecordingExporter::new());
//!     let batch = BatchProcessor::new(exporter, BatchConfig::default());
//!
//!     let provider = SdkTracerProvider::builder()
//!         .with_processor(Arc::new(batch))
//!         .build();
//!
//!     let tracer = provider.tracer("document-load");
//!     tracer.start_span(SpanBuilder::new("documentLoad")).end();
//!
//!     provider.force_flush();
//!     provider.shutdown();
//! }
//! ```

pub mod batch;
pub mod enrich;
pub mod global;
pub mod processor;
pub mod span;
pub mod tracer;

// Re-export main types
pub use batch::{BatchConfig, BatchProcessor, RecordingExporter, SharedExporter, SpanExporter};
pub use enrich::{AttributeSource, EnrichedProvider, SharedAttributeSource};
pub use processor::{ConsoleProcessor, RecordingProcessor, SharedProcessor, SpanProcessor};
pub use span::{
    AttrMap, AttrValue, SpanBuilder, SpanData, SpanKind, SpanStatus, new_span_id, new_trace_id,
};
pub use tracer::{ActiveSpan, SdkTracerProvider, SharedProvider, Tracer, TracerProvider};
