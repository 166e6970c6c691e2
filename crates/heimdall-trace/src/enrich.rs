//! Span enricher: a decorator over the tracer-acquisition step.
//!
//! [`EnrichedProvider`] wraps any [`TracerProvider`] so that every tracer it
//! hands out stamps a fixed attribute set onto each span at start time,
//! before `on_start` processors run and before the producer gets the handle
//! back. The attribute set is read fresh at every span start, so session
//! rotation and global-attribute mutation affect subsequently created spans
//! only, never retroactively.

use std::sync::Arc;

use crate::span::{AttrValue, SpanBuilder};
use crate::tracer::{ActiveSpan, SharedProvider, Tracer, TracerProvider};

/// Supplies the contextual attributes stamped onto every span.
///
/// Returned pairs are applied in order, so later entries (caller-supplied
/// global attributes) overwrite earlier fixed ones on key collision.
pub trait AttributeSource: Send + Sync {
    /// The attribute set for a span starting now.
    fn attributes(&self) -> Vec<(String, AttrValue)>;
}

/// Shared handle to an attribute source.
pub type SharedAttributeSource = Arc<dyn AttributeSource>;

/// Capability-preserving wrapper around a provider's `tracer` operation.
pub struct EnrichedProvider {
    inner: SharedProvider,
    source: SharedAttributeSource,
}

impl EnrichedProvider {
    /// Wrap `inner` so all of its tracers enrich spans from `source`.
    pub fn new(inner: SharedProvider, source: SharedAttributeSource) -> Self {
        Self { inner, source }
    }
}

impl TracerProvider for EnrichedProvider {
    fn tracer(&self, scope: &str) -> Box<dyn Tracer> {
        Box::new(EnrichedTracer {
            inner: self.inner.tracer(scope),
            source: Arc::clone(&self.source),
        })
    }

    fn force_flush(&self) {
        self.inner.force_flush();
    }

    fn shutdown(&self) {
        self.inner.shutdown();
    }
}

struct EnrichedTracer {
    inner: Box<dyn Tracer>,
    source: SharedAttributeSource,
}

impl Tracer for EnrichedTracer {
    fn start_span(&self, mut builder: SpanBuilder) -> ActiveSpan {
        for (key, value) in self.source.attributes() {
            builder.attributes.insert(key, value);
        }
        self.inner.start_span(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::RecordingProcessor;
    use crate::tracer::SdkTracerProvider;
    use std::sync::Mutex;

    struct TestSource {
        globals: Mutex<Vec<(String, AttrValue)>>,
    }

    impl AttributeSource for TestSource {
        fn attributes(&self) -> Vec<(String, AttrValue)> {
            let mut attrs = vec![
                ("app".to_string(), AttrValue::from("my-app")),
                ("session.id".to_string(), AttrValue::from("abc123")),
            ];
            attrs.extend(self.globals.lock().unwrap().clone());
            attrs
        }
    }

    #[test]
    fn test_fixed_attributes_visible_at_start() {
        let recorder = Arc::new(RecordingProcessor::new());
        let sdk = SdkTracerProvider::builder()
            .with_processor(recorder.clone())
            .build();
        let source = Arc::new(TestSource {
            globals: Mutex::new(vec![]),
        });
        let provider = EnrichedProvider::new(Arc::new(sdk), source);

        provider.tracer("xhr").start_span(SpanBuilder::new("GET")).end();

        // on_start already saw the enriched attributes
        let started = recorder.started();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].attributes["app"], AttrValue::from("my-app"));
        assert_eq!(started[0].attributes["session.id"], AttrValue::from("abc123"));
    }

    #[test]
    fn test_globals_override_fixed_keys() {
        let recorder = Arc::new(RecordingProcessor::new());
        let sdk = SdkTracerProvider::builder()
            .with_processor(recorder.clone())
            .build();
        let source = Arc::new(TestSource {
            globals: Mutex::new(vec![("app".to_string(), AttrValue::from("override"))]),
        });
        let provider = EnrichedProvider::new(Arc::new(sdk), source);

        provider.tracer("xhr").start_span(SpanBuilder::new("GET")).end();

        let ended = recorder.ended();
        assert_eq!(ended[0].attributes["app"], AttrValue::from("override"));
    }

    #[test]
    fn test_mutation_is_not_retroactive() {
        let recorder = Arc::new(RecordingProcessor::new());
        let sdk = SdkTracerProvider::builder()
            .with_processor(recorder.clone())
            .build();
        let source = Arc::new(TestSource {
            globals: Mutex::new(vec![]),
        });
        let provider = EnrichedProvider::new(Arc::new(sdk), source.clone());
        let tracer = provider.tracer("xhr");

        tracer.start_span(SpanBuilder::new("first")).end();
        source
            .globals
            .lock()
            .unwrap()
            .push(("deployment".to_string(), AttrValue::from("canary")));
        tracer.start_span(SpanBuilder::new("second")).end();

        let ended = recorder.ended();
        assert!(!ended[0].attributes.contains_key("deployment"));
        assert_eq!(ended[1].attributes["deployment"], AttrValue::from("canary"));
    }
}
