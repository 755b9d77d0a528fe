//! Generation record lifecycle and buffering

use crate::client::IngestionClient;
use crate::config::TelemetryConfig;
use crate::record::{GenerationHandle, GenerationParams, GenerationRecord, IngestionEvent};
use atelier_core::{AtelierResult, Metadata, RecordId, TokenUsage};
use std::collections::HashMap;
use std::sync::Mutex;

/// Records generations and ships them to the collector in batches.
///
/// `start_generation`/`update_generation`/`end_generation` only touch
/// in-process buffers and cannot fail a caller's primary operation. Records
/// reach the network when `flush()` is called; there is no retry or
/// durability guarantee on delivery.
pub struct Recorder {
    client: IngestionClient,
    open: Mutex<HashMap<RecordId, GenerationRecord>>,
    pending: Mutex<Vec<IngestionEvent>>,
}

impl Recorder {
    /// Create a recorder from an explicit configuration.
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            client: IngestionClient::new(&config),
            open: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Create a recorder from environment variables.
    /// Missing credentials are a configuration error naming the variable.
    pub fn from_env() -> AtelierResult<Self> {
        let config = TelemetryConfig::from_env()?;
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Open a generation record and return its handle.
    pub fn start_generation(&self, params: GenerationParams) -> GenerationHandle {
        let record = params.into_record();
        let handle = GenerationHandle { id: record.id };
        tracing::debug!(name = %record.name, model = %record.model, "Created generation");
        if let Ok(mut open) = self.open.lock() {
            open.insert(record.id, record);
        }
        handle
    }

    /// Attach output, usage, and extra metadata to an open record.
    /// Unknown handles are ignored.
    pub fn update_generation(
        &self,
        handle: &GenerationHandle,
        output: serde_json::Value,
        usage: Option<TokenUsage>,
        metadata: Option<Metadata>,
    ) {
        if let Ok(mut open) = self.open.lock() {
            if let Some(record) = open.get_mut(&handle.id) {
                record.output = Some(output);
                if usage.is_some() {
                    record.usage = usage;
                }
                if let Some(extra) = metadata {
                    record.metadata.extend(extra);
                }
                tracing::debug!(id = %handle.id, "Updated generation with output");
            }
        }
    }

    /// Close a record and move it to the pending buffer.
    /// Consumes the handle, so a record is closed at most once.
    pub fn end_generation(&self, handle: GenerationHandle) {
        let record = match self.open.lock() {
            Ok(mut open) => open.remove(&handle.id),
            Err(_) => None,
        };
        if let Some(mut record) = record {
            record.end_time = Some(chrono::Utc::now());
            tracing::debug!(id = %handle.id, "Ended generation");
            if let Ok(mut pending) = self.pending.lock() {
                pending.push(IngestionEvent::generation(record));
            }
        }
    }

    /// Transmit all buffered records to the collector.
    ///
    /// This is the only way to guarantee delivery before process exit;
    /// failed batches are dropped, not re-buffered. Returns the number of
    /// events transmitted.
    pub async fn flush(&self) -> AtelierResult<usize> {
        let events: Vec<IngestionEvent> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        if events.is_empty() {
            return Ok(0);
        }

        self.client.send_batch(&events).await?;
        tracing::info!(count = events.len(), "Flushed pending generations");
        Ok(events.len())
    }

    /// Verify the collector accepts our credentials.
    /// Failure is logged, never raised.
    pub async fn auth_check(&self) -> bool {
        match self.client.auth_check().await {
            Ok(true) => {
                tracing::info!("Telemetry connection verified");
                true
            }
            Ok(false) => {
                tracing::error!("Telemetry auth check rejected credentials");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Telemetry connection verification failed");
                false
            }
        }
    }

    /// Number of records currently open.
    pub fn open_generations(&self) -> usize {
        self.open.lock().map(|open| open.len()).unwrap_or(0)
    }

    /// Number of finished records awaiting flush.
    pub fn pending_events(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    /// Snapshot of the pending buffer.
    pub fn pending_snapshot(&self) -> Vec<IngestionEvent> {
        self.pending
            .lock()
            .map(|pending| pending.clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("client", &self.client)
            .field("open", &self.open_generations())
            .field("pending", &self.pending_events())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
