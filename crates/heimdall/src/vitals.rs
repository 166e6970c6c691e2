//! Web vitals: page-quality metrics as zero-duration spans.

use chrono::Utc;

use heimdall_trace::{SpanBuilder, Tracer, TracerProvider};

/// The vitals the host can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalKind {
    /// Largest contentful paint, milliseconds.
    Lcp,
    /// First input delay, milliseconds.
    Fid,
    /// Cumulative layout shift, unitless score.
    Cls,
}

impl VitalKind {
    fn name(self) -> &'static str {
        match self {
            VitalKind::Lcp => "lcp",
            VitalKind::Fid => "fid",
            VitalKind::Cls => "cls",
        }
    }
}

/// Emits one span per reported vital measurement.
pub struct VitalsCollector {
    tracer: Box<dyn Tracer>,
}

impl VitalsCollector {
    pub fn new(provider: &dyn TracerProvider) -> Self {
        Self {
            tracer: provider.tracer("webvitals"),
        }
    }

    pub fn record(&self, kind: VitalKind, value: f64) {
        let now = Utc::now();
        self.tracer
            .start_span(
                SpanBuilder::new("webVitals")
                    .with_start(now)
                    .with_attribute("component", "webvitals")
                    .with_attribute("vital.name", kind.name())
                    .with_attribute("vital.value", value),
            )
            .end_at(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heimdall_trace::{RecordingProcessor, SdkTracerProvider};
    use std::sync::Arc;

    #[test]
    fn test_vital_span_shape() {
        let recorder = Arc::new(RecordingProcessor::new());
        let provider = SdkTracerProvider::builder()
            .with_processor(recorder.clone())
            .build();
        let vitals = VitalsCollector::new(&provider);

        vitals.record(VitalKind::Lcp, 2480.0);
        vitals.record(VitalKind::Cls, 0.04);

        let ended = recorder.ended();
        assert_eq!(ended.len(), 2);
        assert_eq!(ended[0].name, "webVitals");
        assert_eq!(ended[0].duration_micros(), 0);
        assert_eq!(ended[0].attributes["vital.name"], "lcp".into());
        assert_eq!(ended[0].attributes["vital.value"], 2480.0.into());
        assert_eq!(ended[1].attributes["vital.name"], "cls".into());
        assert_eq!(ended[1].attributes["vital.value"], 0.04.into());
    }
}
