//! Error capture: uncaught errors as zero-duration spans.

use chrono::Utc;
use tracing::debug;

use heimdall_trace::{SpanBuilder, SpanStatus, Tracer, TracerProvider};

/// Emits one span per reported error.
pub struct ErrorReporter {
    tracer: Option<Box<dyn Tracer>>,
}

impl ErrorReporter {
    pub fn new(provider: &dyn TracerProvider) -> Self {
        Self {
            tracer: Some(provider.tracer("error")),
        }
    }

    /// A reporter that drops everything, for configs with error capture
    /// off.
    pub fn disabled() -> Self {
        Self { tracer: None }
    }

    /// Report one error. `kind` names where it came from ("onerror",
    /// "unhandledrejection", or a caller-chosen label for manual reports).
    pub fn report(&self, message: &str, kind: &str) {
        let Some(tracer) = &self.tracer else {
            debug!(kind, "error capture disabled, dropping report");
            return;
        };
        let now = Utc::now();
        let mut span = tracer.start_span(
            SpanBuilder::new("onerror")
                .with_start(now)
                .with_attribute("component", "error")
                .with_attribute("error", true)
                .with_attribute("error.kind", kind)
                .with_attribute("error.message", message),
        );
        span.set_status(SpanStatus::Error {
            message: message.to_string(),
        });
        span.end_at(now);
    }
}
