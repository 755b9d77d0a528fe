//! Telemetry collector configuration

use atelier_core::{AtelierResult, ConfigError};

/// Default collector host.
pub const DEFAULT_HOST: &str = "https://cloud.langfuse.com";

/// Configuration for the telemetry collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Public identifier (basic-auth username)
    pub public_key: String,
    /// Secret credential (basic-auth password)
    pub secret_key: String,
    /// Collector host, e.g. "https://cloud.langfuse.com"
    pub host: String,
}

impl TelemetryConfig {
    /// Create a config with the default host.
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: secret_key.into(),
            host: DEFAULT_HOST.to_string(),
        }
    }

    /// Override the collector host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `LANGFUSE_PUBLIC_KEY` and `LANGFUSE_SECRET_KEY` (required) and
    /// `LANGFUSE_HOST` (optional). A missing required variable is a
    /// `ConfigError::MissingRequired` naming it; no network call is made.
    pub fn from_env() -> AtelierResult<Self> {
        let public_key = require_env("LANGFUSE_PUBLIC_KEY")?;
        let secret_key = require_env("LANGFUSE_SECRET_KEY")?;
        let host = std::env::var("LANGFUSE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        Ok(Self {
            public_key,
            secret_key,
            host,
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AtelierResult<()> {
        if self.public_key.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "LANGFUSE_PUBLIC_KEY".to_string(),
            }
            .into());
        }
        if self.secret_key.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "LANGFUSE_SECRET_KEY".to_string(),
            }
            .into());
        }
        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "LANGFUSE_HOST".to_string(),
                value: self.host.clone(),
                reason: "host must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn require_env(name: &str) -> AtelierResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingRequired {
            field: name.to_string(),
        }
        .into()),
    }
}
