//! ATELIER LLM - Completion Caller
//!
//! Issues chat-completion requests against an OpenAI-compatible gateway
//! with bounded retries on transient failure, and normalizes responses
//! (text or tool invocations, plus token usage) into a flat result shape.
//! Telemetry around the call is optional and best-effort.

pub mod brain;
pub mod client;
pub mod config;
pub mod types;

pub use brain::{Brain, CompletionParams};
pub use client::GatewayClient;
pub use config::GatewayConfig;

use async_trait::async_trait;
use atelier_core::{AtelierResult, LlmError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use types::{ChatCompletionRequest, ChatCompletionResponse};

// ============================================================================
// COMPLETION TRANSPORT TRAIT
// ============================================================================

/// Trait for the wire seam under the completion caller.
/// Implementations must be thread-safe (Send + Sync).
///
/// The production implementation is [`GatewayClient`]; tests inject a
/// scripted transport instead of reaching into internal state.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Issue one chat-completion request against the gateway.
    async fn chat(&self, request: &ChatCompletionRequest)
        -> AtelierResult<ChatCompletionResponse>;
}

// ============================================================================
// MOCK TRANSPORT FOR TESTING
// ============================================================================

/// Mock transport returning scripted outcomes in order.
/// Records every request it receives.
#[derive(Default)]
pub struct MockCompletionTransport {
    script: Mutex<VecDeque<Result<ChatCompletionResponse, LlmError>>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
    calls: AtomicUsize,
}

impl MockCompletionTransport {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a successful response.
    pub fn enqueue_ok(&self, response: ChatCompletionResponse) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(response));
        }
    }

    /// Enqueue a failure.
    pub fn enqueue_err(&self, error: LlmError) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(error));
        }
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request received, if any.
    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.requests
            .lock()
            .ok()
            .and_then(|requests| requests.last().cloned())
    }
}

#[async_trait]
impl CompletionTransport for MockCompletionTransport {
    async fn chat(
        &self,
        request: &ChatCompletionRequest,
    ) -> AtelierResult<ChatCompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let next = self.script.lock().ok().and_then(|mut script| script.pop_front());
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(error)) => Err(error.into()),
            None => Err(LlmError::CallFailed {
                reason: "mock transport script exhausted".to_string(),
            }
            .into()),
        }
    }
}
