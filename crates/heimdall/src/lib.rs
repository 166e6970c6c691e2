//! Heimdall: a real-user-monitoring agent core.
//!
//! Hosts embed the agent, feed it page observations, and it ships spans to
//! a collector:
//!
//! - **Lifecycle**: [`RumAgent`] with explicit `init` / `deinit`; config
//!   errors fail `init`, everything afterwards degrades silently
//! - **Enrichment**: five contextual attributes (location, session,
//!   version, app, instance) stamped on every span at start time
//! - **Pipeline**: batching with size- and deadline-triggered flushes, a
//!   synchronous flush on the host's suspend signal, and fire-and-forget
//!   beacon delivery
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use heimdall::{AgentConfig, ManualSuspendSignal, RumAgent};
//!
//! #[tokio::main]
//! async fn main() -> heimdall::Result<()> {
//!     let signal = Arc::new(ManualSuspendSignal::new());
//!     let agent = RumAgent::new(signal.clone());
//!
//!     let config = AgentConfig::new("https://collector.example.com/v1/rum", "shop")
//!         .with_auth("rum-token")
//!         .with_environment("prod");
//!     agent.init(config)?;
//!
//!     // ... host bridge feeds events via agent.observe(...) ...
//!
//!     signal.suspend(); // page hide: flush synchronously
//!     agent.deinit();
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod report;
pub mod session;
pub mod signal;
pub mod vitals;

pub use agent::RumAgent;
pub use config::AgentConfig;
pub use context::{
    AGENT_VERSION, AgentContext, KEY_APP, KEY_INSTANCE_ID, KEY_LOCATION, KEY_SESSION_ID,
    KEY_VERSION,
};
pub use error::{ConfigError, Result};
pub use logging::init_logging;
pub use report::ErrorReporter;
pub use session::{SessionLimits, SessionTracker, new_instance_id};
pub use signal::{ManualSuspendSignal, SharedSuspendSignal, Subscription, SuspendCallback, SuspendSignal};
pub use vitals::{VitalKind, VitalsCollector};

// Re-export the crates hosts interact with directly.
pub use heimdall_instrument as instrument;
pub use heimdall_trace as trace;
