//! Instrumentation producers.
//!
//! Each producer turns one family of [`HostEvent`]s into spans on its own
//! tracer scope. Producers are constructed disabled and only emit once the
//! registry enables them; they never interpret each other's events, so a
//! misbehaving producer cannot block the rest.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use regex::Regex;

use heimdall_trace::{SpanBuilder, SpanKind, SpanStatus, Tracer, TracerProvider};

use crate::event::{
    HostEvent, InteractionEvent, LongTaskEvent, NavigationTiming, RequestApi, RequestEvent,
    ResourceTiming, SocketEvent, SocketOp,
};

/// Per-producer configuration, routed through from the agent config
/// unchanged. The registry does not interpret any of it.
#[derive(Debug, Clone, Default)]
pub struct InstrumentOptions {
    /// URLs matching any pattern produce no network spans.
    pub ignore_urls: Vec<Regex>,
    /// Per-event-kind overrides for the interaction producer; `false`
    /// disables an auto-instrumented event kind.
    pub adjust_auto_instrumented_events: HashMap<String, bool>,
    /// Resource initiator types to observe; empty means all.
    pub allowed_initiator_types: Vec<String>,
}

/// A pluggable span producer.
pub trait Instrumentation: Send + Sync {
    /// Stable producer name (also its tracer scope).
    fn name(&self) -> &'static str;

    /// Enable or disable span production.
    fn set_enabled(&self, enabled: bool);

    /// Whether the producer currently emits spans.
    fn is_enabled(&self) -> bool;

    /// Handle one host event. Producers self-select; unrelated events are
    /// ignored.
    fn record(&self, event: &HostEvent);
}

/// Shared handle to a producer.
pub type SharedInstrumentation = Arc<dyn Instrumentation>;

fn is_ignored(patterns: &[Regex], url: &str) -> bool {
    patterns.iter().any(|p| p.is_match(url))
}

/// Document load timing spans.
pub struct DocumentLoadInstrumentation {
    enabled: AtomicBool,
    tracer: Box<dyn Tracer>,
}

impl DocumentLoadInstrumentation {
    fn new(tracer: Box<dyn Tracer>) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            tracer,
        }
    }
}

impl Instrumentation for DocumentLoadInstrumentation {
    fn name(&self) -> &'static str {
        "document-load"
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn record(&self, event: &HostEvent) {
        if !self.is_enabled() {
            return;
        }
        let HostEvent::Navigation(timing) = event else {
            return;
        };
        let NavigationTiming {
            url,
            started_at,
            dom_content_loaded_at,
            loaded_at,
        } = timing;

        let mut builder = SpanBuilder::new("documentLoad")
            .with_start(*started_at)
            .with_attribute("component", "document-load")
            .with_attribute("http.url", url.as_str());
        if let Some(dcl) = dom_content_loaded_at {
            let offset_ms = (*dcl - *started_at).num_milliseconds().max(0);
            builder = builder.with_attribute("document.dom_content_loaded_ms", offset_ms);
        }
        self.tracer.start_span(builder).end_at(*loaded_at);
    }
}

/// Shared span shape for the two request producers.
fn record_request(tracer: &dyn Tracer, component: &str, request: &RequestEvent) {
    let builder = SpanBuilder::new(request.method.clone())
        .with_kind(SpanKind::Client)
        .with_start(request.started_at)
        .with_attribute("component", component)
        .with_attribute("http.method", request.method.as_str())
        .with_attribute("http.url", request.url.as_str());

    let mut span = tracer.start_span(builder);
    if let Some(status_code) = request.status_code {
        span.set_attribute("http.status_code", status_code);
    }
    if let Some(error) = &request.error {
        span.set_status(SpanStatus::Error {
            message: error.clone(),
        });
    }
    span.end_at(request.ended_at);
}

/// XHR request spans.
pub struct XhrInstrumentation {
    enabled: AtomicBool,
    tracer: Box<dyn Tracer>,
    ignore_urls: Vec<Regex>,
}

impl Instrumentation for XhrInstrumentation {
    fn name(&self) -> &'static str {
        "xhr"
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn record(&self, event: &HostEvent) {
        if !self.is_enabled() {
            return;
        }
        let HostEvent::Request(request) = event else {
            return;
        };
        if request.api != RequestApi::Xhr || is_ignored(&self.ignore_urls, &request.url) {
            return;
        }
        record_request(self.tracer.as_ref(), "xhr", request);
    }
}

/// Fetch request spans.
pub struct FetchInstrumentation {
    enabled: AtomicBool,
    tracer: Box<dyn Tracer>,
    ignore_urls: Vec<Regex>,
}

impl Instrumentation for FetchInstrumentation {
    fn name(&self) -> &'static str {
        "fetch"
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn record(&self, event: &HostEvent) {
        if !self.is_enabled() {
            return;
        }
        let HostEvent::Request(request) = event else {
            return;
        };
        if request.api != RequestApi::Fetch || is_ignored(&self.ignore_urls, &request.url) {
            return;
        }
        record_request(self.tracer.as_ref(), "fetch", request);
    }
}

/// User interaction spans.
pub struct UserInteractionInstrumentation {
    enabled: AtomicBool,
    tracer: Box<dyn Tracer>,
    adjust_events: HashMap<String, bool>,
}

impl Instrumentation for UserInteractionInstrumentation {
    fn name(&self) -> &'static str {
        "user-interaction"
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn record(&self, event: &HostEvent) {
        if !self.is_enabled() {
            return;
        }
        let HostEvent::Interaction(InteractionEvent {
            kind,
            target,
            occurred_at,
        }) = event
        else {
            return;
        };
        if self.adjust_events.get(kind) == Some(&false) {
            return;
        }

        self.tracer
            .start_span(
                SpanBuilder::new(kind.clone())
                    .with_start(*occurred_at)
                    .with_attribute("component", "user-interaction")
                    .with_attribute("event_type", kind.as_str())
                    .with_attribute("target", target.as_str()),
            )
            .end_at(*occurred_at);
    }
}

/// Post-load resource observer spans.
pub struct ResourceObserverInstrumentation {
    enabled: AtomicBool,
    tracer: Box<dyn Tracer>,
    ignore_urls: Vec<Regex>,
    allowed_initiator_types: Vec<String>,
}

impl Instrumentation for ResourceObserverInstrumentation {
    fn name(&self) -> &'static str {
        "resource-observer"
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn record(&self, event: &HostEvent) {
        if !self.is_enabled() {
            return;
        }
        let HostEvent::Resource(ResourceTiming {
            url,
            initiator_type,
            started_at,
            ended_at,
        }) = event
        else {
            return;
        };
        if is_ignored(&self.ignore_urls, url) {
            return;
        }
        if !self.allowed_initiator_types.is_empty()
            && !self.allowed_initiator_types.iter().any(|t| t == initiator_type)
        {
            return;
        }

        self.tracer
            .start_span(
                SpanBuilder::new("resourceFetch")
                    .with_start(*started_at)
                    .with_attribute("component", "resource-observer")
                    .with_attribute("http.url", url.as_str())
                    .with_attribute("resource.initiator_type", initiator_type.as_str()),
            )
            .end_at(*ended_at);
    }
}

/// Web socket lifecycle spans.
pub struct WebSocketInstrumentation {
    enabled: AtomicBool,
    tracer: Box<dyn Tracer>,
    ignore_urls: Vec<Regex>,
}

impl Instrumentation for WebSocketInstrumentation {
    fn name(&self) -> &'static str {
        "websocket"
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn record(&self, event: &HostEvent) {
        if !self.is_enabled() {
            return;
        }
        let HostEvent::Socket(socket) = event else {
            return;
        };
        if is_ignored(&self.ignore_urls, &socket.url) {
            return;
        }
        let SocketEvent {
            op,
            url,
            error,
            started_at,
            ended_at,
        } = socket;

        let name = match op {
            SocketOp::Connect => "connect",
            SocketOp::Send => "send",
            SocketOp::Close => "close",
        };
        let mut span = self.tracer.start_span(
            SpanBuilder::new(name)
                .with_kind(SpanKind::Client)
                .with_start(*started_at)
                .with_attribute("component", "websocket")
                .with_attribute("http.url", url.as_str()),
        );
        if let Some(error) = error {
            span.set_status(SpanStatus::Error {
                message: error.clone(),
            });
        }
        span.end_at(*ended_at);
    }
}

/// Long task spans.
pub struct LongTaskInstrumentation {
    enabled: AtomicBool,
    tracer: Box<dyn Tracer>,
}

impl Instrumentation for LongTaskInstrumentation {
    fn name(&self) -> &'static str {
        "long-task"
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn record(&self, event: &HostEvent) {
        if !self.is_enabled() {
            return;
        }
        let HostEvent::LongTask(LongTaskEvent {
            started_at,
            ended_at,
        }) = event
        else {
            return;
        };
        let duration_ms = (*ended_at - *started_at).num_milliseconds().max(0);

        self.tracer
            .start_span(
                SpanBuilder::new("longtask")
                    .with_start(*started_at)
                    .with_attribute("component", "longtask")
                    .with_attribute("longtask.duration_ms", duration_ms),
            )
            .end_at(*ended_at);
    }
}

/// Construct the full producer set against `provider`, all disabled.
///
/// Enabling happens later, atomically, through the registry's single
/// registration call.
pub fn build_producers(
    provider: &dyn TracerProvider,
    options: &InstrumentOptions,
) -> Vec<SharedInstrumentation> {
    vec![
        Arc::new(DocumentLoadInstrumentation::new(
            provider.tracer("document-load"),
        )),
        Arc::new(XhrInstrumentation {
            enabled: AtomicBool::new(false),
            tracer: provider.tracer("xhr"),
            ignore_urls: options.ignore_urls.clone(),
        }),
        Arc::new(FetchInstrumentation {
            enabled: AtomicBool::new(false),
            tracer: provider.tracer("fetch"),
            ignore_urls: options.ignore_urls.clone(),
        }),
        Arc::new(UserInteractionInstrumentation {
            enabled: AtomicBool::new(false),
            tracer: provider.tracer("user-interaction"),
            adjust_events: options.adjust_auto_instrumented_events.clone(),
        }),
        Arc::new(ResourceObserverInstrumentation {
            enabled: AtomicBool::new(false),
            tracer: provider.tracer("resource-observer"),
            ignore_urls: options.ignore_urls.clone(),
            allowed_initiator_types: options.allowed_initiator_types.clone(),
        }),
        Arc::new(WebSocketInstrumentation {
            enabled: AtomicBool::new(false),
            tracer: provider.tracer("websocket"),
            ignore_urls: options.ignore_urls.clone(),
        }),
        Arc::new(LongTaskInstrumentation {
            enabled: AtomicBool::new(false),
            tracer: provider.tracer("long-task"),
        }),
    ]
}
