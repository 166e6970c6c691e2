//! Instrumentation layer for the Heimdall RUM agent.
//!
//! The agent core never touches the page directly. The host bridge reports
//! what it sees as [`HostEvent`]s, and a fixed set of producers turns them
//! into spans:
//!
//! - **Producers**: one [`Instrumentation`] per event family (document load,
//!   xhr, fetch, user interaction, resource observer, web socket, long task),
//!   each on its own tracer scope
//! - **Registry**: [`register_instrumentations`] enables the whole set and
//!   returns the idempotent [`DeregistrationHandle`] that disables it again
//!
//! Producers are constructed disabled so a half-initialized agent never
//! emits spans.

pub mod event;
pub mod producers;
pub mod registry;

pub use event::{
    HostEvent, InteractionEvent, LongTaskEvent, NavigationTiming, RequestApi, RequestEvent,
    ResourceTiming, SocketEvent, SocketOp,
};
pub use producers::{Instrumentation, InstrumentOptions, SharedInstrumentation, build_producers};
pub use registry::{DeregistrationHandle, InstrumentationSet, register_instrumentations};
