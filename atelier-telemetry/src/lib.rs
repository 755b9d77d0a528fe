//! ATELIER Telemetry - Generation Records
//!
//! Records one "generation" per LLM call (input, output, usage) and ships
//! batches to a Langfuse-compatible collector. Delivery is best-effort
//! observability, never a correctness dependency: record lifecycle
//! operations are buffer-only, and the network is touched only by
//! `flush()` and `auth_check()`.

pub mod client;
pub mod config;
pub mod record;
pub mod recorder;
pub mod registry;

pub use client::IngestionClient;
pub use config::TelemetryConfig;
pub use record::{GenerationHandle, GenerationParams, GenerationRecord, IngestionEvent};
pub use recorder::Recorder;
pub use registry::{global, init_global, reset_global};
