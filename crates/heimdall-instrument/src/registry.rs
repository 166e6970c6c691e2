//! Instrumentation registry.
//!
//! Producers are built disabled, handed to an [`InstrumentationSet`] for
//! event dispatch, and enabled in one step by [`register_instrumentations`],
//! which returns the [`DeregistrationHandle`] that later disables them all.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::event::HostEvent;
use crate::producers::SharedInstrumentation;

/// The set of producers currently wired to the agent.
#[derive(Clone, Default)]
pub struct InstrumentationSet {
    producers: Vec<SharedInstrumentation>,
}

impl InstrumentationSet {
    pub fn new(producers: Vec<SharedInstrumentation>) -> Self {
        Self { producers }
    }

    /// Offer one host event to every producer. Producers self-select, so
    /// dispatch order carries no meaning.
    pub fn dispatch(&self, event: &HostEvent) {
        for producer in &self.producers {
            producer.record(event);
        }
    }

    pub fn producers(&self) -> &[SharedInstrumentation] {
        &self.producers
    }
}

/// Releases a set of registered producers, exactly once.
///
/// Dropping the handle without calling [`release`](Self::release) leaves the
/// producers enabled; teardown is an explicit act.
pub struct DeregistrationHandle {
    producers: Vec<SharedInstrumentation>,
    released: AtomicBool,
}

impl DeregistrationHandle {
    /// Disable every producer this handle covers. Subsequent calls do
    /// nothing.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        for producer in &self.producers {
            producer.set_enabled(false);
            debug!(name = producer.name(), "instrumentation disabled");
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Enable every producer in the set and return the handle that undoes it.
pub fn register_instrumentations(set: &InstrumentationSet) -> DeregistrationHandle {
    for producer in set.producers() {
        producer.set_enabled(true);
        debug!(name = producer.name(), "instrumentation enabled");
    }
    DeregistrationHandle {
        producers: set.producers().to_vec(),
        released: AtomicBool::new(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producers::Instrumentation;
    use std::sync::Arc;

    struct StubProducer {
        enabled: AtomicBool,
    }

    impl Instrumentation for StubProducer {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn set_enabled(&self, enabled: bool) {
            self.enabled.store(enabled, Ordering::SeqCst);
        }

        fn is_enabled(&self) -> bool {
            self.enabled.load(Ordering::SeqCst)
        }

        fn record(&self, _event: &HostEvent) {}
    }

    fn stub_set() -> InstrumentationSet {
        InstrumentationSet::new(vec![
            Arc::new(StubProducer {
                enabled: AtomicBool::new(false),
            }),
            Arc::new(StubProducer {
                enabled: AtomicBool::new(false),
            }),
        ])
    }

    #[test]
    fn test_register_enables_all() {
        let set = stub_set();
        assert!(set.producers().iter().all(|p| !p.is_enabled()));

        let handle = register_instrumentations(&set);
        assert!(set.producers().iter().all(|p| p.is_enabled()));
        assert!(!handle.is_released());
    }

    #[test]
    fn test_release_disables_all_once() {
        let set = stub_set();
        let handle = register_instrumentations(&set);

        handle.release();
        assert!(handle.is_released());
        assert!(set.producers().iter().all(|p| !p.is_enabled()));

        // A later registration is not undone by re-releasing the old handle.
        let second = register_instrumentations(&set);
        handle.release();
        assert!(set.producers().iter().all(|p| p.is_enabled()));
        second.release();
        assert!(set.producers().iter().all(|p| !p.is_enabled()));
    }

}
