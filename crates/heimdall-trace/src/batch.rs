//! Batching export pipeline.
//!
//! Finished spans are queued and handed to a [`SpanExporter`] in batches of
//! at most `buffer_size`, either when a batch fills or when `buffer_timeout`
//! has elapsed since the oldest unflushed span, whichever comes first. Both
//! automatic triggers drain on a deferred timer turn; only [`force_flush`]
//! (the suspend-signal path) drains synchronously on the caller's turn. The
//! queue is bounded at `2 * buffer_size`; under pressure the oldest entries
//! are dropped. Export is fire-and-forget and never retried.
//!
//! [`force_flush`]: SpanProcessor::force_flush

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::processor::SpanProcessor;
use crate::span::SpanData;

/// Delivers finished span batches to a collector.
///
/// `export` must be non-blocking: implementations hand the batch off (e.g.
/// spawn the network send) and return immediately. A failed batch is simply
/// dropped.
pub trait SpanExporter: Send + Sync {
    /// Request delivery of one batch.
    fn export(&self, batch: Vec<SpanData>);

    /// Release exporter resources. No exports follow.
    fn shutdown(&self) {}
}

/// Shared handle to a span exporter.
pub type SharedExporter = Arc<dyn SpanExporter>;

/// Batching knobs.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum delay before an incomplete batch is flushed.
    pub buffer_timeout: Duration,
    /// Maximum spans per export call.
    pub buffer_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            buffer_timeout: Duration::from_millis(5_000),
            buffer_size: 20,
        }
    }
}

impl BatchConfig {
    /// Internal queue capacity: twice the batch size.
    pub fn max_queue_size(&self) -> usize {
        self.buffer_size * 2
    }
}

#[derive(Default)]
struct QueueInner {
    spans: VecDeque<SpanData>,
    /// Enqueue time of the oldest unflushed span; `None` when empty.
    oldest_enqueued: Option<Instant>,
    dropped: u64,
}

struct QueueState {
    queue: Mutex<QueueInner>,
    notify: Notify,
    /// A full batch is waiting; drain on the next timer turn.
    drain_now: AtomicBool,
    is_shutdown: AtomicBool,
}

/// A panic mid-push leaves the queue usable; buffered spans still flush.
fn lock_queue(queue: &Mutex<QueueInner>) -> std::sync::MutexGuard<'_, QueueInner> {
    match queue.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Span processor that batches finished spans for export.
///
/// Must be created inside a Tokio runtime; both automatic flush triggers run
/// on a spawned timer task.
pub struct BatchProcessor {
    exporter: SharedExporter,
    config: BatchConfig,
    state: Arc<QueueState>,
}

impl BatchProcessor {
    /// Create the processor and start its timer task.
    pub fn new(exporter: SharedExporter, config: BatchConfig) -> Self {
        let state = Arc::new(QueueState {
            queue: Mutex::new(QueueInner::default()),
            notify: Notify::new(),
            drain_now: AtomicBool::new(false),
            is_shutdown: AtomicBool::new(false),
        });

        let task_state = Arc::clone(&state);
        let task_exporter = Arc::clone(&exporter);
        let timeout = config.buffer_timeout;
        let batch_size = config.buffer_size;
        tokio::spawn(async move {
            loop {
                if task_state.is_shutdown.load(Ordering::SeqCst) {
                    return;
                }
                if task_state.drain_now.swap(false, Ordering::SeqCst) {
                    drain_queue(&task_state, &task_exporter, batch_size);
                    continue;
                }

                let oldest = lock_queue(&task_state.queue).oldest_enqueued;
                match oldest {
                    None => task_state.notify.notified().await,
                    Some(enqueued) => {
                        let deadline = enqueued + timeout;
                        tokio::select! {
                            _ = tokio::time::sleep_until(deadline) => {
                                if task_state.is_shutdown.load(Ordering::SeqCst) {
                                    return;
                                }
                                // The queue may have been flushed and
                                // refilled; only drain if still due.
                                let due = {
                                    let queue = lock_queue(&task_state.queue);
                                    matches!(queue.oldest_enqueued,
                                        Some(t) if t + timeout <= Instant::now())
                                };
                                if due {
                                    drain_queue(&task_state, &task_exporter, batch_size);
                                }
                            }
                            _ = task_state.notify.notified() => {}
                        }
                    }
                }
            }
        });

        Self {
            exporter,
            config,
            state,
        }
    }
}

/// Drain the whole queue in `batch_size` chunks.
fn drain_queue(state: &QueueState, exporter: &SharedExporter, batch_size: usize) {
    loop {
        let batch = {
            let mut queue = lock_queue(&state.queue);
            if queue.spans.is_empty() {
                queue.oldest_enqueued = None;
                let dropped = std::mem::take(&mut queue.dropped);
                if dropped > 0 {
                    tracing::debug!(dropped, "spans dropped under queue pressure");
                }
                return;
            }
            let take = queue.spans.len().min(batch_size);
            let batch: Vec<SpanData> = queue.spans.drain(..take).collect();
            if queue.spans.is_empty() {
                queue.oldest_enqueued = None;
            }
            batch
        };
        exporter.export(batch);
    }
}

impl SpanProcessor for BatchProcessor {
    fn on_start(&self, _span: &mut SpanData) {}

    fn on_end(&self, span: SpanData) {
        if self.state.is_shutdown.load(Ordering::SeqCst) {
            return;
        }

        let mut wake_timer = false;
        let batch_ready = {
            let mut queue = lock_queue(&self.state.queue);

            if queue.spans.len() >= self.config.max_queue_size() {
                queue.spans.pop_front();
                queue.dropped += 1;
            }

            if queue.oldest_enqueued.is_none() {
                queue.oldest_enqueued = Some(Instant::now());
                wake_timer = true;
            }
            queue.spans.push_back(span);

            queue.spans.len() >= self.config.buffer_size
        };

        if batch_ready {
            self.state.drain_now.store(true, Ordering::SeqCst);
        }
        if batch_ready || wake_timer {
            self.state.notify.notify_one();
        }
    }

    fn force_flush(&self) {
        drain_queue(&self.state, &self.exporter, self.config.buffer_size);
    }

    fn shutdown(&self) {
        if self.state.is_shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        drain_queue(&self.state, &self.exporter, self.config.buffer_size);
        self.state.notify.notify_one();
        self.exporter.shutdown();
    }
}

/// Test double that records every exported batch.
#[derive(Debug, Default)]
pub struct RecordingExporter {
    batches: Mutex<Vec<Vec<SpanData>>>,
}

impl RecordingExporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exported batches in export order.
    pub fn batches(&self) -> Vec<Vec<SpanData>> {
        self.batches.lock().unwrap().clone()
    }

    /// Total span count across all batches.
    pub fn span_count(&self) -> usize {
        self.batches.lock().unwrap().iter().map(Vec::len).sum()
    }
}

impl SpanExporter for RecordingExporter {
    fn export(&self, batch: Vec<SpanData>) {
        self.batches.lock().unwrap().push(batch);
    }
}
