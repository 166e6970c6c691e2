//! Fire-and-forget beacon transport.
//!
//! Batches are POSTed to the collector endpoint on a spawned task; the
//! caller's turn is never blocked and the response is never awaited for
//! control flow. Delivery failures are debug-logged and dropped; a RUM
//! agent must never stall the page for telemetry.

use std::time::Duration;

use heimdall_trace::{SpanData, SpanExporter};

use crate::error::{ExportError, Result};
use crate::zipkin::ZipkinEncoder;

/// Default request timeout. Generous: it only bounds the spawned send.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the beacon transport.
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    /// Collector endpoint URL.
    pub endpoint: String,

    /// Auth token, appended once as an `auth=` query parameter.
    pub auth: Option<String>,

    /// Service name reported on every span.
    pub service_name: String,

    /// Request timeout.
    pub timeout: Duration,
}

impl BeaconConfig {
    /// Create a config for the given endpoint and service name.
    pub fn new(endpoint: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth: None,
            service_name: service_name.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the auth token.
    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP exporter delivering Zipkin-encoded batches to the collector.
pub struct BeaconExporter {
    client: reqwest::Client,
    /// Endpoint with the auth parameter already applied.
    url: String,
    encoder: ZipkinEncoder,
}

impl BeaconExporter {
    /// Build the exporter. The auth query parameter is computed here, once.
    pub fn new(config: BeaconConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExportError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: beacon_url(&config.endpoint, config.auth.as_deref()),
            encoder: ZipkinEncoder::new(config.service_name),
        })
    }

    /// The resolved endpoint URL (auth applied).
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Append the auth token as a query parameter.
fn beacon_url(endpoint: &str, auth: Option<&str>) -> String {
    match auth {
        None => endpoint.to_string(),
        Some(token) => {
            let separator = if endpoint.contains('?') { '&' } else { '?' };
            format!("{endpoint}{separator}auth={}", urlencoding::encode(token))
        }
    }
}

impl SpanExporter for BeaconExporter {
    fn export(&self, batch: Vec<SpanData>) {
        if batch.is_empty() {
            return;
        }

        let body = self.encoder.encode_batch(&batch).to_string();
        let request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        let span_count = batch.len();

        // Fire-and-forget: the send is requested here; nothing awaits it.
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::debug!(
                        status = %response.status(),
                        span_count,
                        "collector rejected span batch"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, span_count, "span batch delivery failed");
                }
            }
        });
    }
}

impl std::fmt::Debug for BeaconExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeaconExporter")
            .field("url", &self.url)
            .finish()
    }
}
