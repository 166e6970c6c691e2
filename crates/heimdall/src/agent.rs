//! Agent lifecycle: the `init` / `deinit` state machine.
//!
//! [`RumAgent`] is the single entry point hosts hold. `init` wires the
//! whole pipeline (enrichment, batching, beacon, producers, suspend flush)
//! and is the only operation that can fail; once Initialized everything
//! degrades silently. `deinit` tears the pipeline down and returns to
//! Uninitialized, after which a later `init` builds a fresh instance with a
//! fresh instance id.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use heimdall_export::BeaconExporter;
use heimdall_instrument::{
    DeregistrationHandle, HostEvent, InstrumentationSet, build_producers,
    register_instrumentations,
};
use heimdall_trace::{
    AttrMap, BatchProcessor, ConsoleProcessor, EnrichedProvider, SdkTracerProvider,
    SharedExporter, SharedProvider, global,
};

use crate::config::AgentConfig;
use crate::context::AgentContext;
use crate::error::Result;
use crate::report::ErrorReporter;
use crate::session::{SessionTracker, new_instance_id};
use crate::signal::{SharedSuspendSignal, Subscription};
use crate::vitals::{VitalKind, VitalsCollector};

struct AgentInner {
    context: Arc<AgentContext>,
    provider: SharedProvider,
    instruments: InstrumentationSet,
    handle: DeregistrationHandle,
    reporter: ErrorReporter,
    vitals: VitalsCollector,
    // Held so the suspend callback stays registered until deinit.
    _subscription: Subscription,
}

/// The RUM agent lifecycle controller.
///
/// Uninitialized until [`init`](Self::init) succeeds, then Initialized
/// until [`deinit`](Self::deinit). Every other operation is a silent no-op
/// while Uninitialized.
pub struct RumAgent {
    inner: Mutex<Option<AgentInner>>,
    signal: SharedSuspendSignal,
}

impl RumAgent {
    /// Create an uninitialized agent bound to the host's suspend signal.
    pub fn new(signal: SharedSuspendSignal) -> Self {
        Self {
            inner: Mutex::new(None),
            signal,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<AgentInner>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Bring the agent up. A no-op when already Initialized; the running
    /// instance keeps its configuration and instance id.
    pub fn init(&self, config: AgentConfig) -> Result<()> {
        let mut slot = self.lock();
        if slot.is_some() {
            debug!("init called while initialized, ignoring");
            return Ok(());
        }

        // Validation happens before anything is constructed, so a config
        // error leaves the agent fully Uninitialized.
        let ignore_urls = config.validate()?;

        let instance_id = new_instance_id();
        let context = Arc::new(AgentContext::new(
            instance_id.clone(),
            config.app.clone(),
            Arc::new(SessionTracker::new()),
        ));
        let mut globals = config.global_attributes.clone();
        if let Some(environment) = &config.environment {
            globals
                .entry("environment".to_string())
                .or_insert_with(|| environment.as_str().into());
        }
        context.set_global_attributes(globals);

        // Debug mode may run without a beacon; validation only lets an
        // empty beacon_url through in that case.
        let exporter: Option<SharedExporter> = match &config.exporter {
            Some(exporter) => Some(Arc::clone(exporter)),
            None if !config.beacon_url.is_empty() => {
                Some(Arc::new(BeaconExporter::new(config.beacon_config())?))
            }
            None => None,
        };

        // Caller processors run first so their on_start hooks observe the
        // span exactly as enrichment left it, before batching consumes it.
        let mut builder = SdkTracerProvider::builder();
        if let Some(processor) = &config.span_processor {
            builder = builder.with_processor(Arc::clone(processor));
        }
        if let Some(exporter) = exporter {
            let batch = BatchProcessor::new(exporter, config.batch_config());
            builder = builder.with_processor(Arc::new(batch));
        }
        if config.debug {
            builder = builder.with_processor(Arc::new(ConsoleProcessor));
        }
        let sdk: SharedProvider = Arc::new(builder.build());
        let provider: SharedProvider =
            Arc::new(EnrichedProvider::new(sdk, context.clone()));

        let instruments = InstrumentationSet::new(build_producers(
            provider.as_ref(),
            &config.instrument_options(ignore_urls),
        ));
        let handle = register_instrumentations(&instruments);

        let flush_provider = Arc::clone(&provider);
        let subscription = self
            .signal
            .subscribe(Arc::new(move || flush_provider.force_flush()));

        let reporter = if config.capture_errors {
            ErrorReporter::new(provider.as_ref())
        } else {
            ErrorReporter::disabled()
        };
        let vitals = VitalsCollector::new(provider.as_ref());

        global::set_tracer_provider(Arc::clone(&provider));

        info!(instance_id = %instance_id, app = %config.app, "agent initialized");
        *slot = Some(AgentInner {
            context,
            provider,
            instruments,
            handle,
            reporter,
            vitals,
            _subscription: subscription,
        });
        Ok(())
    }

    /// Tear the agent down. A no-op when Uninitialized.
    ///
    /// Releases the instrumentation registration, flushes and shuts down
    /// the span pipeline, and clears the global provider slot.
    pub fn deinit(&self) {
        let Some(inner) = self.lock().take() else {
            debug!("deinit called while uninitialized, ignoring");
            return;
        };
        inner.handle.release();
        inner.provider.shutdown();
        global::clear_tracer_provider();
        info!(instance_id = %inner.context.instance_id(), "agent deinitialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// The running instance's id, stable from init to deinit.
    pub fn instance_id(&self) -> Option<String> {
        self.lock()
            .as_ref()
            .map(|inner| inner.context.instance_id().to_string())
    }

    /// The current session id, rotating per the session limits.
    pub fn session_id(&self) -> Option<String> {
        self.lock().as_ref().map(|inner| inner.context.session_id())
    }

    /// Replace the global attribute set. Affects spans started afterwards
    /// only; an empty map clears it.
    pub fn set_global_attributes(&self, attributes: AttrMap) {
        if let Some(inner) = self.lock().as_ref() {
            inner.context.set_global_attributes(attributes);
        }
    }

    /// Deliver one host observation to the producers. Navigation events
    /// also update the location stamped on subsequent spans.
    pub fn observe(&self, event: &HostEvent) {
        let guard = self.lock();
        let Some(inner) = guard.as_ref() else {
            return;
        };
        if let HostEvent::Navigation(timing) = event {
            inner.context.update_location(timing.url.clone());
        }
        inner.instruments.dispatch(event);
    }

    /// Report an error as a zero-duration span. `kind` names the error
    /// source ("onerror", "unhandledrejection", ...).
    pub fn error(&self, message: &str, kind: &str) {
        if let Some(inner) = self.lock().as_ref() {
            inner.reporter.report(message, kind);
        }
    }

    /// Report a web vital measurement.
    pub fn record_vital(&self, kind: VitalKind, value: f64) {
        if let Some(inner) = self.lock().as_ref() {
            inner.vitals.record(kind, value);
        }
    }

    /// Synchronously flush everything buffered in the span pipeline.
    pub fn force_flush(&self) {
        if let Some(inner) = self.lock().as_ref() {
            inner.provider.force_flush();
        }
    }
}
