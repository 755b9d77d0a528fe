//! HTTP client for the collector's ingestion API

use crate::config::TelemetryConfig;
use crate::record::IngestionEvent;
use atelier_core::{AtelierResult, TelemetryError};
use reqwest::Client;
use serde::Serialize;

/// Client for the collector's batched ingestion endpoint.
/// Authenticates with the public key as username and the secret as password.
pub struct IngestionClient {
    client: Client,
    public_key: String,
    secret_key: String,
    host: String,
}

#[derive(Serialize)]
struct IngestionBatch<'a> {
    batch: &'a [IngestionEvent],
}

impl IngestionClient {
    /// Create a new ingestion client.
    pub fn new(config: &TelemetryConfig) -> Self {
        tracing::info!(host = %config.host, "Initializing telemetry client");
        Self {
            client: Client::new(),
            public_key: config.public_key.clone(),
            secret_key: config.secret_key.clone(),
            host: config.host.clone(),
        }
    }

    /// The collector host this client talks to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Transmit a batch of events to the collector.
    pub async fn send_batch(&self, events: &[IngestionEvent]) -> AtelierResult<()> {
        let url = format!("{}/api/public/ingestion", self.host);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.public_key, Some(&self.secret_key))
            .json(&IngestionBatch { batch: events })
            .send()
            .await
            .map_err(|e| TelemetryError::Transport {
                host: self.host.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(TelemetryError::IngestionFailed {
                host: self.host.clone(),
                status: status.as_u16() as i32,
                message,
            }
            .into())
        }
    }

    /// Round-trip a lightweight authenticated check against the collector.
    pub async fn auth_check(&self) -> AtelierResult<bool> {
        let url = format!("{}/api/public/projects", self.host);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.public_key, Some(&self.secret_key))
            .send()
            .await
            .map_err(|e| TelemetryError::Transport {
                host: self.host.clone(),
                reason: e.to_string(),
            })?;

        Ok(response.status().is_success())
    }
}

impl std::fmt::Debug for IngestionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionClient")
            .field("host", &self.host)
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
