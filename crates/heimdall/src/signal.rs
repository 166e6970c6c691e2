//! Suspend signal: the host's "page is going away" notification.
//!
//! The agent subscribes a flush callback at init; hosts fire the signal
//! from whatever platform hook they have (visibility change, process
//! suspend, test harness). The callback runs synchronously inside the
//! firing call so the flush completes before the host's turn ends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Callback invoked when the host is about to suspend.
pub type SuspendCallback = Arc<dyn Fn() + Send + Sync>;

/// Source of suspend notifications.
pub trait SuspendSignal: Send + Sync {
    /// Register a callback; it fires on every suspend until the returned
    /// [`Subscription`] is dropped.
    fn subscribe(&self, callback: SuspendCallback) -> Subscription;
}

/// Shared handle to a suspend signal.
pub type SharedSuspendSignal = Arc<dyn SuspendSignal>;

type SubscriberMap = Mutex<HashMap<u64, SuspendCallback>>;

/// A suspend signal fired explicitly by the host.
#[derive(Default)]
pub struct ManualSuspendSignal {
    subscribers: Arc<SubscriberMap>,
    next_id: AtomicU64,
}

impl ManualSuspendSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal, running every live callback before returning.
    pub fn suspend(&self) {
        let callbacks: Vec<SuspendCallback> = match self.subscribers.lock() {
            Ok(subscribers) => subscribers.values().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().values().cloned().collect(),
        };
        for callback in callbacks {
            callback();
        }
    }
}

impl SuspendSignal for ManualSuspendSignal {
    fn subscribe(&self, callback: SuspendCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.insert(id, callback);
        }
        Subscription {
            subscribers: Arc::downgrade(&self.subscribers),
            id,
        }
    }
}

/// Keeps a suspend callback registered; dropping it unsubscribes.
pub struct Subscription {
    subscribers: Weak<SubscriberMap>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            if let Ok(mut subscribers) = subscribers.lock() {
                subscribers.remove(&self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_callback(counter: Arc<AtomicUsize>) -> SuspendCallback {
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_suspend_runs_callbacks() {
        let signal = ManualSuspendSignal::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let _subscription = signal.subscribe(counter_callback(counter.clone()));

        signal.suspend();
        signal.suspend();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropped_subscription_stops_firing() {
        let signal = ManualSuspendSignal::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let subscription = signal.subscribe(counter_callback(counter.clone()));

        signal.suspend();
        drop(subscription);
        signal.suspend();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_multiple_subscribers() {
        let signal = ManualSuspendSignal::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let _a = signal.subscribe(counter_callback(counter.clone()));
        let _b = signal.subscribe(counter_callback(counter.clone()));

        signal.suspend();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
