//! Normalized completion output types.
//!
//! The flat result shape handed back to orchestrator callers. Either
//! `content` or `tool_calls` is meaningfully populated for a given result;
//! the remote service does not return both in practice.

use crate::Metadata;
use serde::{Deserialize, Serialize};

/// Token usage counts for one completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: i64, completion_tokens: i64, total_tokens: i64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

/// A structured request from the model to invoke a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Gateway-assigned call id
    pub id: String,
    /// Tool name
    pub name: String,
    /// Decoded argument mapping. Empty when the payload failed to decode.
    #[serde(default)]
    pub arguments: Metadata,
    /// Decode error description, if the argument payload was malformed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output of one LLM call, normalized from the gateway response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    /// Textual content (absent when the model returned tool calls)
    pub content: Option<String>,
    /// Tool invocations (absent when the model returned text)
    pub tool_calls: Option<Vec<ToolInvocation>>,
    /// Model identifier the gateway actually used
    pub model: String,
    /// Token usage counts
    pub usage: TokenUsage,
}

impl CompletionResult {
    /// Whether the model responded with tool invocations.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}
