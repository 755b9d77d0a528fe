//! Error types for atelier operations

use thiserror::Error;

/// Configuration errors.
/// Raised at first use of a component whose credentials are missing or
/// malformed, never at process start.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// LLM gateway errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: i64,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Max retries ({attempts}) exceeded. Last error: {last_error}")]
    RetriesExhausted { attempts: i32, last_error: String },

    #[error("LLM call failed: {reason}")]
    CallFailed { reason: String },
}

impl LlmError {
    /// Whether another attempt against the gateway is safe.
    /// Rate limiting and upstream request failures are retried; everything
    /// else fails the call immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. } | LlmError::RequestFailed { .. }
        )
    }
}

/// Telemetry collector errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Ingestion request to {host} failed with status {status}: {message}")]
    IngestionFailed {
        host: String,
        status: i32,
        message: String,
    },

    #[error("Transport error talking to {host}: {reason}")]
    Transport { host: String, reason: String },

    #[error("Telemetry buffer lock poisoned")]
    LockPoisoned,
}

/// Master error type for all atelier operations.
#[derive(Debug, Clone, Error)]
pub enum AtelierError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

/// Result type alias for atelier operations.
pub type AtelierResult<T> = Result<T, AtelierError>;

// =============================================================================
// TESTS
// =============================================================================
