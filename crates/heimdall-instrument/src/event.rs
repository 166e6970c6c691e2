//! Host events feeding the instrumentation producers.
//!
//! The agent core has no platform hooks of its own; the host bridge
//! observes the page (navigation timing, request lifecycles, input events,
//! long tasks, resource timing, web sockets) and delivers each observation
//! as a [`HostEvent`]. Producers self-select the events they understand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation delivered by the host bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// The document finished loading.
    Navigation(NavigationTiming),
    /// An XHR or fetch request completed.
    Request(RequestEvent),
    /// A user interaction occurred.
    Interaction(InteractionEvent),
    /// A task blocked the main thread.
    LongTask(LongTaskEvent),
    /// A sub-resource finished loading after the document did.
    Resource(ResourceTiming),
    /// A web socket lifecycle step completed.
    Socket(SocketEvent),
}

/// Document load timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationTiming {
    /// Document URL.
    pub url: String,
    /// Navigation start.
    pub started_at: DateTime<Utc>,
    /// DOMContentLoaded, if observed.
    pub dom_content_loaded_at: Option<DateTime<Utc>>,
    /// Load event end.
    pub loaded_at: DateTime<Utc>,
}

/// Which request API produced a [`RequestEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestApi {
    Xhr,
    Fetch,
}

/// A completed network request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEvent {
    /// Originating API.
    pub api: RequestApi,
    /// HTTP method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Response status, absent when the request never completed.
    pub status_code: Option<u16>,
    /// Failure description, if the request errored.
    pub error: Option<String>,
    /// Request start.
    pub started_at: DateTime<Utc>,
    /// Request end.
    pub ended_at: DateTime<Utc>,
}

/// A user interaction (click, keydown, submit, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Event name as the platform reports it.
    pub kind: String,
    /// Description of the event target.
    pub target: String,
    /// When the interaction occurred.
    pub occurred_at: DateTime<Utc>,
}

/// A main-thread blocking task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongTaskEvent {
    /// Task start.
    pub started_at: DateTime<Utc>,
    /// Task end.
    pub ended_at: DateTime<Utc>,
}

/// Timing for a sub-resource fetched after document load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTiming {
    /// Resource URL.
    pub url: String,
    /// Initiator type as the platform reports it ("img", "script", ...).
    pub initiator_type: String,
    /// Fetch start.
    pub started_at: DateTime<Utc>,
    /// Fetch end.
    pub ended_at: DateTime<Utc>,
}

/// Web socket lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketOp {
    Connect,
    Send,
    Close,
}

/// A completed web socket operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketEvent {
    /// Lifecycle step.
    pub op: SocketOp,
    /// Socket URL.
    pub url: String,
    /// Failure description, if the operation errored.
    pub error: Option<String>,
    /// Operation start.
    pub started_at: DateTime<Utc>,
    /// Operation end.
    pub ended_at: DateTime<Utc>,
}
