//! Logging setup for hosts embedding the agent.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize stderr logging. With `verbose`, everything logs at debug;
/// otherwise `RUST_LOG` applies, defaulting to info.
///
/// Call at most once per process; hosts with their own subscriber should
/// skip this entirely.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
