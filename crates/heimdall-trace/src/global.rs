//! Process-wide active tracer provider slot.
//!
//! The lifecycle controller publishes its (enriched) provider here so code
//! outside the agent can start spans against the active pipeline. The slot
//! is scoped to one Initialized lifecycle: `init` sets it, `deinit` clears
//! it.

use std::sync::RwLock;

use crate::tracer::SharedProvider;

static ACTIVE_PROVIDER: RwLock<Option<SharedProvider>> = RwLock::new(None);

fn write_slot() -> std::sync::RwLockWriteGuard<'static, Option<SharedProvider>> {
    match ACTIVE_PROVIDER.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Publish `provider` as the active tracer provider, replacing any previous
/// one.
pub fn set_tracer_provider(provider: SharedProvider) {
    *write_slot() = Some(provider);
}

/// The currently active tracer provider, if an agent is initialized.
pub fn tracer_provider() -> Option<SharedProvider> {
    match ACTIVE_PROVIDER.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Clear the active provider slot.
pub fn clear_tracer_provider() {
    *write_slot() = None;
}
