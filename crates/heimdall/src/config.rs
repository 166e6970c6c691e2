//! Agent configuration.
//!
//! [`AgentConfig`] is a plain serde struct so hosts can load it from a TOML
//! file or build it in code; every field has a default so partial files
//! work. Validation happens once, inside `init`, and is the only place a
//! bad config can fail loudly.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use heimdall_export::BeaconConfig;
use heimdall_instrument::InstrumentOptions;
use heimdall_trace::{AttrValue, BatchConfig, SharedExporter, SharedProcessor};

use crate::error::{ConfigError, Result};

const DEFAULT_APP: &str = "unknown-browser-app";
const DEFAULT_BUFFER_TIMEOUT_MS: u64 = 5000;
const DEFAULT_BUFFER_SIZE: usize = 20;

/// Configuration for the RUM agent.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Collector endpoint the beacon posts to. Required unless an exporter
    /// override is supplied.
    pub beacon_url: String,

    /// Auth token appended to the beacon URL as a query parameter.
    pub rum_auth: Option<String>,

    /// Application name stamped on every span.
    pub app: String,

    /// Deployment environment, folded into the global attributes as
    /// `environment` when set.
    pub environment: Option<String>,

    /// Caller-supplied attributes stamped on every span. These win over
    /// the agent's own fixed attributes on key collision.
    pub global_attributes: HashMap<String, AttrValue>,

    /// Per-event-kind overrides for the interaction producer.
    pub adjust_auto_instrumented_events: HashMap<String, bool>,

    /// Resource initiator types to observe; empty means all.
    pub allowed_initiator_types: Vec<String>,

    /// Regex patterns for URLs that produce no network spans.
    pub ignore_urls: Vec<String>,

    /// How long a span may sit in the export buffer before a flush.
    pub buffer_timeout_ms: u64,

    /// Spans per export batch; the queue holds at most twice this.
    pub buffer_size: usize,

    /// Permit a plain-http beacon URL.
    pub allow_insecure_beacon: bool,

    /// Produce spans for uncaught errors reported by the host.
    pub capture_errors: bool,

    /// Mirror finished spans to the log at debug level.
    pub debug: bool,

    /// Extra span processor to run alongside the export pipeline.
    #[serde(skip)]
    pub span_processor: Option<SharedProcessor>,

    /// Replaces the beacon transport entirely. Intended for tests.
    #[serde(skip)]
    pub exporter: Option<SharedExporter>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            beacon_url: String::new(),
            rum_auth: None,
            app: DEFAULT_APP.to_string(),
            environment: None,
            global_attributes: HashMap::new(),
            adjust_auto_instrumented_events: HashMap::new(),
            allowed_initiator_types: Vec::new(),
            ignore_urls: Vec::new(),
            buffer_timeout_ms: DEFAULT_BUFFER_TIMEOUT_MS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            allow_insecure_beacon: false,
            capture_errors: true,
            debug: false,
            span_processor: None,
            exporter: None,
        }
    }
}

impl AgentConfig {
    /// Start from the defaults with the two fields most configs set.
    pub fn new(beacon_url: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            beacon_url: beacon_url.into(),
            app: app.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.rum_auth = Some(token.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_global_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Self {
        self.global_attributes.insert(key.into(), value.into());
        self
    }

    /// Check the parts of the config that can fail, compiling the ignore
    /// patterns as a side effect.
    ///
    /// Beacon checks apply only when the beacon will actually be used: an
    /// exporter override replaces it, and debug mode may run without one.
    pub fn validate(&self) -> Result<Vec<Regex>> {
        if self.exporter.is_none() && !self.debug {
            if self.beacon_url.is_empty() {
                return Err(ConfigError::MissingBeaconUrl);
            }
            if !self.allow_insecure_beacon && !self.beacon_url.starts_with("https://") {
                return Err(ConfigError::InsecureBeaconUrl(self.beacon_url.clone()));
            }
            if self.rum_auth.is_none() {
                warn!("rum_auth not configured, beacon requests will be unauthenticated");
            }
        }
        self.ignore_patterns()
    }

    pub(crate) fn ignore_patterns(&self) -> Result<Vec<Regex>> {
        self.ignore_urls
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidIgnorePattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }

    pub(crate) fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            buffer_timeout: Duration::from_millis(self.buffer_timeout_ms),
            buffer_size: self.buffer_size,
        }
    }

    pub(crate) fn beacon_config(&self) -> BeaconConfig {
        let mut beacon = BeaconConfig::new(self.beacon_url.clone(), self.app.clone());
        if let Some(token) = &self.rum_auth {
            beacon = beacon.with_auth(token.clone());
        }
        beacon
    }

    pub(crate) fn instrument_options(&self, ignore_urls: Vec<Regex>) -> InstrumentOptions {
        InstrumentOptions {
            ignore_urls,
            adjust_auto_instrumented_events: self.adjust_auto_instrumented_events.clone(),
            allowed_initiator_types: self.allowed_initiator_types.clone(),
        }
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("beacon_url", &self.beacon_url)
            .field("rum_auth", &self.rum_auth.as_deref().map(|_| "<redacted>"))
            .field("app", &self.app)
            .field("environment", &self.environment)
            .field("global_attributes", &self.global_attributes)
            .field(
                "adjust_auto_instrumented_events",
                &self.adjust_auto_instrumented_events,
            )
            .field("allowed_initiator_types", &self.allowed_initiator_types)
            .field("ignore_urls", &self.ignore_urls)
            .field("buffer_timeout_ms", &self.buffer_timeout_ms)
            .field("buffer_size", &self.buffer_size)
            .field("allow_insecure_beacon", &self.allow_insecure_beacon)
            .field("capture_errors", &self.capture_errors)
            .field("debug", &self.debug)
            .field("span_processor", &self.span_processor.is_some())
            .field("exporter", &self.exporter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.app, "unknown-browser-app");
        assert_eq!(config.buffer_timeout_ms, 5000);
        assert_eq!(config.buffer_size, 20);
        assert!(config.capture_errors);
        assert!(!config.debug);
    }

    #[test]
    fn test_validate_requires_beacon_url() {
        let config = AgentConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingBeaconUrl)
        ));
    }

    #[test]
    fn test_validate_rejects_plain_http() {
        let config = AgentConfig::new("http://collector.test/v1/rum", "shop");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InsecureBeaconUrl(_))
        ));

        let mut config = AgentConfig::new("http://collector.test/v1/rum", "shop");
        config.allow_insecure_beacon = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_mode_skips_beacon_checks() {
        let mut config = AgentConfig::default();
        config.debug = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ignore_pattern() {
        let mut config = AgentConfig::new("https://collector.test/v1/rum", "shop");
        config.ignore_urls = vec!["[unclosed".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidIgnorePattern { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
beacon_url = "https://collector.test/v1/rum"
rum_auth = "token-1"
app = "checkout"
environment = "prod"
ignore_urls = ["collector\\.test"]
buffer_size = 10

[global_attributes]
team = "web"
release = 42
"#
        )
        .unwrap();

        let config = AgentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.app, "checkout");
        assert_eq!(config.rum_auth.as_deref(), Some("token-1"));
        assert_eq!(config.buffer_size, 10);
        assert_eq!(config.buffer_timeout_ms, 5000);
        assert_eq!(config.global_attributes["team"], "web".into());
        assert_eq!(config.global_attributes["release"], 42i64.into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_rejects_unknown_field() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "beacon_uri = \"https://collector.test\"").unwrap();
        assert!(matches!(
            AgentConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
