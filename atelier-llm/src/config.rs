//! Gateway configuration

use atelier_core::{AtelierResult, ConfigError};
use std::time::Duration;

/// Default gateway base URL.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default total attempts per completion call.
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// Default base delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Configuration for the completion gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Bearer credential for the gateway
    pub api_key: String,
    /// Gateway base URL
    pub base_url: String,
    /// Total attempts per call (first try included)
    pub max_retries: i32,
    /// Base delay; attempt `n` waits `n * retry_delay` before retrying
    pub retry_delay: Duration,
}

impl GatewayConfig {
    /// Create a config with default base URL and retry settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override the gateway base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the retry settings.
    pub fn with_retries(mut self, max_retries: i32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `OPENROUTER_API_KEY` (required) and `OPENROUTER_BASE_URL`
    /// (optional). A missing key is a `ConfigError::MissingRequired`
    /// naming the variable; no network call is made.
    pub fn from_env() -> AtelierResult<Self> {
        let api_key = match std::env::var("OPENROUTER_API_KEY") {
            Ok(value) if !value.is_empty() => value,
            _ => {
                return Err(ConfigError::MissingRequired {
                    field: "OPENROUTER_API_KEY".to_string(),
                }
                .into())
            }
        };
        let base_url = std::env::var("OPENROUTER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self::new(api_key).with_base_url(base_url))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AtelierResult<()> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "OPENROUTER_API_KEY".to_string(),
            }
            .into());
        }
        if self.max_retries < 1 {
            return Err(ConfigError::InvalidValue {
                field: "max_retries".to_string(),
                value: self.max_retries.to_string(),
                reason: "max_retries must be at least 1".to_string(),
            }
            .into());
        }
        if self.retry_delay.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "retry_delay".to_string(),
                value: format!("{:?}", self.retry_delay),
                reason: "retry_delay must be positive".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
