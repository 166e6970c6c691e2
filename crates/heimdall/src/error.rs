//! Error types for the agent core.

use thiserror::Error;

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while validating configuration or constructing the agent.
///
/// These are the only fatal errors the agent surfaces; everything after a
/// successful `init` degrades silently instead of failing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No collector endpoint was configured.
    #[error("beacon_url is required")]
    MissingBeaconUrl,

    /// The collector endpoint is not https and plain-http was not opted
    /// into.
    #[error("beacon_url '{0}' is not https (set allow_insecure_beacon to override)")]
    InsecureBeaconUrl(String),

    /// An ignore_urls entry is not a valid regular expression.
    #[error("invalid ignore_urls pattern '{pattern}': {source}")]
    InvalidIgnorePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// A config file could not be parsed.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The beacon transport could not be constructed.
    #[error(transparent)]
    Beacon(#[from] heimdall_export::ExportError),
}
