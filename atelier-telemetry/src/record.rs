//! Generation record types (flat model, one record per LLM call)

use atelier_core::{new_record_id, Metadata, RecordId, Timestamp, TokenUsage};
use serde::Serialize;

/// One recorded unit of observability data for a single LLM call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub id: RecordId,
    pub name: String,
    pub model: String,
    /// Request-side payload (messages, temperature, max tokens)
    pub input: serde_json::Value,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub model_parameters: Metadata,
    /// Normalized completion output, attached on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// Token usage counts, attached on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    pub start_time: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
}

/// Parameters for opening a generation record.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub name: String,
    pub model: String,
    pub input: serde_json::Value,
    pub metadata: Metadata,
    pub model_parameters: Metadata,
}

impl GenerationParams {
    /// Create params with an empty input payload.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            input: serde_json::Value::Null,
            metadata: Metadata::new(),
            model_parameters: Metadata::new(),
        }
    }

    /// Attach the request-side payload.
    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = input;
        self
    }

    /// Attach free-form metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach model parameters (temperature, max tokens, ...).
    pub fn with_model_parameters(mut self, model_parameters: Metadata) -> Self {
        self.model_parameters = model_parameters;
        self
    }

    pub(crate) fn into_record(self) -> GenerationRecord {
        GenerationRecord {
            id: new_record_id(),
            name: self.name,
            model: self.model,
            input: self.input,
            metadata: self.metadata,
            model_parameters: self.model_parameters,
            output: None,
            usage: None,
            start_time: chrono::Utc::now(),
            end_time: None,
        }
    }
}

/// Token for an open generation record.
///
/// Deliberately neither `Clone` nor `Copy`: `Recorder::end_generation`
/// consumes the handle, so a record can only be closed once.
#[derive(Debug, PartialEq, Eq)]
pub struct GenerationHandle {
    pub(crate) id: RecordId,
}

impl GenerationHandle {
    /// The id of the underlying record.
    pub fn id(&self) -> RecordId {
        self.id
    }
}

/// One event in an ingestion batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionEvent {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: Timestamp,
    pub body: GenerationRecord,
}

impl IngestionEvent {
    /// Wrap a finished generation record.
    pub fn generation(record: GenerationRecord) -> Self {
        Self {
            id: new_record_id(),
            event_type: "generation-create".to_string(),
            timestamp: chrono::Utc::now(),
            body: record,
        }
    }
}
