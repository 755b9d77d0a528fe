//! Conversation message and thread types.
//!
//! Messages are a tagged sum type: one variant per role, each carrying only
//! the fields meaningful to it. Immutable once created - there are no
//! mutation methods.

use crate::{Metadata, Timestamp, TokenUsage};
use serde::{Deserialize, Serialize};

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// Message from the user.
    User {
        content: String,
        timestamp: Timestamp,
        #[serde(default)]
        metadata: Metadata,
    },
    /// Message from the assistant/agent.
    Assistant {
        content: String,
        model: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<TokenUsage>,
        timestamp: Timestamp,
        #[serde(default)]
        metadata: Metadata,
    },
    /// A tool call requested by the model.
    ToolCall {
        tool_name: String,
        arguments: Metadata,
        call_id: String,
        timestamp: Timestamp,
        #[serde(default)]
        metadata: Metadata,
    },
    /// The result of executing a tool call.
    ToolResult {
        tool_name: String,
        result: serde_json::Value,
        call_id: String,
        success: bool,
        timestamp: Timestamp,
        #[serde(default)]
        metadata: Metadata,
    },
}

impl Message {
    /// Create a user message timestamped now.
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
            timestamp: chrono::Utc::now(),
            metadata: Metadata::new(),
        }
    }

    /// Create an assistant message timestamped now.
    pub fn assistant(content: impl Into<String>, model: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
            model: model.into(),
            usage: None,
            timestamp: chrono::Utc::now(),
            metadata: Metadata::new(),
        }
    }

    /// Create an assistant message carrying token usage.
    pub fn assistant_with_usage(
        content: impl Into<String>,
        model: impl Into<String>,
        usage: TokenUsage,
    ) -> Self {
        Message::Assistant {
            content: content.into(),
            model: model.into(),
            usage: Some(usage),
            timestamp: chrono::Utc::now(),
            metadata: Metadata::new(),
        }
    }

    /// Create a tool-call message timestamped now.
    pub fn tool_call(
        tool_name: impl Into<String>,
        arguments: Metadata,
        call_id: impl Into<String>,
    ) -> Self {
        Message::ToolCall {
            tool_name: tool_name.into(),
            arguments,
            call_id: call_id.into(),
            timestamp: chrono::Utc::now(),
            metadata: Metadata::new(),
        }
    }

    /// Create a tool-result message timestamped now.
    pub fn tool_result(
        tool_name: impl Into<String>,
        result: serde_json::Value,
        call_id: impl Into<String>,
        success: bool,
    ) -> Self {
        Message::ToolResult {
            tool_name: tool_name.into(),
            result,
            call_id: call_id.into(),
            success,
            timestamp: chrono::Utc::now(),
            metadata: Metadata::new(),
        }
    }

    /// The role tag for this message.
    pub fn role(&self) -> &'static str {
        match self {
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
            Message::ToolCall { .. } => "tool_call",
            Message::ToolResult { .. } => "tool_result",
        }
    }

    /// When this message was created.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Message::User { timestamp, .. }
            | Message::Assistant { timestamp, .. }
            | Message::ToolCall { timestamp, .. }
            | Message::ToolResult { timestamp, .. } => *timestamp,
        }
    }
}

// ============================================================================
// CONVERSATION THREAD
// ============================================================================

/// An ordered conversation with metadata.
/// Created empty; messages are appended by external orchestration.
/// There is no deletion path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub thread_id: String,
    pub user_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Thread {
    /// Create a new empty thread.
    pub fn new(thread_id: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            thread_id: thread_id.into(),
            user_id: None,
            messages: Vec::new(),
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a user id.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Append a message and bump `updated_at`.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = chrono::Utc::now();
    }

    /// Number of messages in the thread.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the thread has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
