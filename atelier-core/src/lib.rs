//! ATELIER Core - Entity Types
//!
//! Pure data structures with no behavior beyond construction, equality,
//! and serialization. All other crates depend on this. This crate contains
//! ONLY data types - no business logic, no I/O.

pub mod agent;
pub mod completion;
pub mod error;
pub mod identity;
pub mod message;

pub use agent::{
    AgentRole, AgentRoleParseError, AgentState, AgentStatus, AgentStatusParseError,
    AgentSystemState, DraftEvaluation, RevisionStatus, RevisionStatusParseError,
};
pub use completion::{CompletionResult, TokenUsage, ToolInvocation};
pub use error::{AtelierError, AtelierResult, ConfigError, LlmError, TelemetryError};
pub use identity::{new_record_id, Metadata, RecordId, Timestamp};
pub use message::{Message, Thread};
