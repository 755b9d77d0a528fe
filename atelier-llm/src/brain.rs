//! Retrying completion caller
//!
//! Wraps one remote completion request with bounded linear-backoff retries
//! on transient failure and normalizes the response into a flat
//! [`CompletionResult`]. A generation record is optionally opened around
//! the call; record operations are buffer-only and can never fail or hang
//! the call itself.

use crate::client::{GatewayClient, PROVIDER};
use crate::config::GatewayConfig;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ToolSpec};
use crate::CompletionTransport;
use atelier_core::{
    AtelierError, AtelierResult, CompletionResult, LlmError, Metadata, TokenUsage, ToolInvocation,
};
use atelier_telemetry::{GenerationHandle, GenerationParams, Recorder};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// COMPLETION PARAMETERS
// ============================================================================

/// Parameters for one completion call.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    /// Ordered, role-tagged message sequence (must be non-empty)
    pub messages: Vec<ChatMessage>,
    /// Model identifier, forwarded verbatim to the gateway
    pub model: String,
    /// Tool declarations, forwarded verbatim when present
    pub tools: Option<Vec<ToolSpec>>,
    /// Sampling temperature
    pub temperature: f64,
    /// Maximum tokens to generate; omitted from the wire when absent
    pub max_tokens: Option<i32>,
    /// Whether to open a generation record around the call
    pub track_generation: bool,
    /// Custom generation name; defaults to `llm_call_<model tail>`
    pub generation_name: Option<String>,
    /// Custom generation metadata
    pub generation_metadata: Option<Metadata>,
}

impl CompletionParams {
    /// Create params with default temperature (0.7) and tracking enabled.
    pub fn new(messages: Vec<ChatMessage>, model: impl Into<String>) -> Self {
        Self {
            messages,
            model: model.into(),
            tools: None,
            temperature: 0.7,
            max_tokens: None,
            track_generation: true,
            generation_name: None,
            generation_metadata: None,
        }
    }

    /// Attach tool declarations.
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Disable generation tracking for this call.
    pub fn untracked(mut self) -> Self {
        self.track_generation = false;
        self
    }

    /// Name the generation record.
    pub fn with_generation_name(mut self, name: impl Into<String>) -> Self {
        self.generation_name = Some(name.into());
        self
    }

    /// Attach metadata to the generation record.
    pub fn with_generation_metadata(mut self, metadata: Metadata) -> Self {
        self.generation_metadata = Some(metadata);
        self
    }
}

// ============================================================================
// BRAIN
// ============================================================================

/// The completion caller.
pub struct Brain {
    transport: Arc<dyn CompletionTransport>,
    max_retries: i32,
    retry_delay: Duration,
    recorder: Option<Arc<Recorder>>,
}

impl Brain {
    /// Create a caller backed by the HTTP gateway client.
    pub fn new(config: GatewayConfig) -> AtelierResult<Self> {
        config.validate()?;
        Ok(Self {
            transport: Arc::new(GatewayClient::new(&config)),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            recorder: None,
        })
    }

    /// Create a caller from environment variables.
    /// A missing `OPENROUTER_API_KEY` is a configuration error naming the
    /// variable; no network call is attempted.
    pub fn from_env() -> AtelierResult<Self> {
        Self::new(GatewayConfig::from_env()?)
    }

    /// Create a caller over an injected transport with default retry
    /// settings.
    pub fn with_transport(transport: Arc<dyn CompletionTransport>) -> Self {
        Self {
            transport,
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
            retry_delay: crate::config::DEFAULT_RETRY_DELAY,
            recorder: None,
        }
    }

    /// Override the retry settings.
    pub fn with_retries(mut self, max_retries: i32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Attach a telemetry recorder.
    pub fn with_recorder(mut self, recorder: Arc<Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Make a completion request with bounded retries.
    ///
    /// Transient failures (rate limiting, upstream request failures) are
    /// retried up to `max_retries` total attempts, waiting
    /// `retry_delay * attempt_number` between attempts. Any other failure
    /// ends the call immediately. If a generation record was opened it is
    /// closed exactly once on every exit path.
    pub async fn complete(&self, params: CompletionParams) -> AtelierResult<CompletionResult> {
        let CompletionParams {
            messages,
            model,
            tools,
            temperature,
            max_tokens,
            track_generation,
            generation_name,
            generation_metadata,
        } = params;

        let request = ChatCompletionRequest {
            model: model.clone(),
            messages,
            temperature,
            max_tokens,
            tools,
        };

        let mut generation: Option<GenerationHandle> = if track_generation {
            self.recorder.as_ref().map(|recorder| {
                let name =
                    generation_name.unwrap_or_else(|| default_generation_name(&model));
                let input = serde_json::json!({
                    "messages": request.messages,
                    "temperature": request.temperature,
                    "max_tokens": request.max_tokens,
                });
                let mut model_parameters = Metadata::new();
                model_parameters.insert(
                    "temperature".to_string(),
                    serde_json::json!(request.temperature),
                );
                if let Some(max_tokens) = request.max_tokens {
                    model_parameters
                        .insert("max_tokens".to_string(), serde_json::json!(max_tokens));
                }
                recorder.start_generation(
                    GenerationParams::new(name, model.as_str())
                        .with_input(input)
                        .with_metadata(generation_metadata.unwrap_or_default())
                        .with_model_parameters(model_parameters),
                )
            })
        } else {
            None
        };

        let mut last_error: Option<LlmError> = None;
        for attempt in 1..=self.max_retries {
            match self.transport.chat(&request).await {
                Ok(response) => match normalize_response(response) {
                    Ok(result) => {
                        tracing::debug!(model = %result.model, attempt, "Completion succeeded");
                        self.finish_generation(generation.take(), &result);
                        return Ok(result);
                    }
                    Err(err) => {
                        self.close_generation(generation.take());
                        return Err(LlmError::CallFailed {
                            reason: err.to_string(),
                        }
                        .into());
                    }
                },
                Err(AtelierError::Llm(err)) if err.is_transient() => {
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        error = %err,
                        "Transient gateway failure"
                    );
                    last_error = Some(err);
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay * attempt as u32).await;
                    }
                }
                Err(err) => {
                    self.close_generation(generation.take());
                    let reason = match err {
                        AtelierError::Llm(inner) => inner.to_string(),
                        other => other.to_string(),
                    };
                    return Err(LlmError::CallFailed { reason }.into());
                }
            }
        }

        self.close_generation(generation.take());
        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
        .into())
    }

    fn finish_generation(&self, handle: Option<GenerationHandle>, result: &CompletionResult) {
        if let (Some(recorder), Some(handle)) = (self.recorder.as_ref(), handle) {
            let output = serde_json::to_value(result).unwrap_or(serde_json::Value::Null);
            recorder.update_generation(&handle, output, Some(result.usage), None);
            recorder.end_generation(handle);
        }
    }

    fn close_generation(&self, handle: Option<GenerationHandle>) {
        if let (Some(recorder), Some(handle)) = (self.recorder.as_ref(), handle) {
            recorder.end_generation(handle);
        }
    }
}

impl std::fmt::Debug for Brain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Brain")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("recorder", &self.recorder.is_some())
            .finish()
    }
}

// ============================================================================
// RESPONSE NORMALIZATION
// ============================================================================

/// Normalize a gateway response into the flat result shape.
///
/// A tool invocation whose argument payload fails to decode degrades to an
/// empty mapping with an attached error description; the other invocations
/// in the same response stay usable and the call still succeeds.
fn normalize_response(response: ChatCompletionResponse) -> Result<CompletionResult, LlmError> {
    let usage = TokenUsage::new(
        response.usage.prompt_tokens,
        response.usage.completion_tokens.unwrap_or(0),
        response.usage.total_tokens,
    );

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: "No completion in response".to_string(),
        })?;

    let tool_calls = match message.tool_calls {
        Some(calls) if !calls.is_empty() => Some(
            calls
                .into_iter()
                .map(|call| {
                    match serde_json::from_str::<Metadata>(&call.function.arguments) {
                        Ok(arguments) => ToolInvocation {
                            id: call.id,
                            name: call.function.name,
                            arguments,
                            error: None,
                        },
                        Err(e) => ToolInvocation {
                            id: call.id,
                            name: call.function.name,
                            arguments: Metadata::new(),
                            error: Some(format!("Failed to parse arguments: {}", e)),
                        },
                    }
                })
                .collect(),
        ),
        _ => None,
    };

    Ok(CompletionResult {
        content: message.content,
        tool_calls,
        model: response.model,
        usage,
    })
}

fn default_generation_name(model: &str) -> String {
    let tail = model.rsplit('/').next().unwrap_or(model);
    format!("llm_call_{}", tail)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Choice, FunctionCall, ResponseMessage, ToolCallPayload, Usage};
    use crate::MockCompletionTransport;
    use atelier_telemetry::{Recorder, TelemetryConfig};

    const MODEL: &str = "anthropic/claude-3.5-sonnet";

    fn text_response(text: &str) -> ChatCompletionResponse {
        ChatCompletionResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some(text.to_string()),
                    tool_calls: None,
                },
            }],
            model: MODEL.to_string(),
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: Some(8),
                total_tokens: 18,
            },
        }
    }

    fn tool_response(calls: &[(&str, &str, &str)]) -> ChatCompletionResponse {
        ChatCompletionResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: None,
                    tool_calls: Some(
                        calls
                            .iter()
                            .map(|(id, name, arguments)| ToolCallPayload {
                                id: id.to_string(),
                                function: FunctionCall {
                                    name: name.to_string(),
                                    arguments: arguments.to_string(),
                                },
                            })
                            .collect(),
                    ),
                },
            }],
            model: MODEL.to_string(),
            usage: Usage {
                prompt_tokens: 15,
                completion_tokens: Some(12),
                total_tokens: 27,
            },
        }
    }

    fn transient_error() -> LlmError {
        LlmError::RequestFailed {
            provider: "openrouter".to_string(),
            status: 502,
            message: "bad gateway".to_string(),
        }
    }

    fn test_recorder() -> Arc<Recorder> {
        Arc::new(Recorder::new(TelemetryConfig::new("pk-test", "sk-test")))
    }

    fn user_params() -> CompletionParams {
        CompletionParams::new(vec![ChatMessage::user("Hello")], MODEL)
    }

    #[tokio::test]
    async fn test_text_only_completion() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_ok(text_response("Hello! How can I help you?"));
        let brain = Brain::with_transport(mock.clone());

        let result = brain.complete(user_params()).await.unwrap();
        assert_eq!(result.content.as_deref(), Some("Hello! How can I help you?"));
        assert!(result.tool_calls.is_none());
        assert_eq!(result.model, MODEL);
        assert_eq!(result.usage, TokenUsage::new(10, 8, 18));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_forwards_supplied_parameters() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_ok(text_response("ok"));
        let brain = Brain::with_transport(mock.clone());

        let params = CompletionParams::new(
            vec![
                ChatMessage::system("You are a helpful assistant."),
                ChatMessage::user("Who are you?"),
            ],
            MODEL,
        )
        .with_temperature(0.2)
        .with_max_tokens(64)
        .with_tools(vec![ToolSpec::function(
            "web_search",
            "Search the web",
            serde_json::json!({"type": "object"}),
        )]);

        brain.complete(params).await.unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, Some(64));
        assert_eq!(request.tools.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_request_omits_unsupplied_parameters() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_ok(text_response("ok"));
        let brain = Brain::with_transport(mock.clone());

        brain.complete(user_params()).await.unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request.temperature, 0.7);
        assert!(request.max_tokens.is_none());
        assert!(request.tools.is_none());
    }

    #[tokio::test]
    async fn test_tool_calls_parsed() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_ok(tool_response(&[
            ("call_1", "web_search", r#"{"query": "latest AI news"}"#),
            ("call_2", "summarize", r#"{"length": 3}"#),
        ]));
        let brain = Brain::with_transport(mock.clone());

        let result = brain.complete(user_params()).await.unwrap();
        assert!(result.content.is_none());
        let calls = result.tool_calls.unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].name, "web_search");
        assert_eq!(
            calls[0].arguments.get("query"),
            Some(&serde_json::json!("latest AI news"))
        );
        assert!(calls[0].error.is_none());
        assert_eq!(
            calls[1].arguments.get("length"),
            Some(&serde_json::json!(3))
        );
    }

    #[tokio::test]
    async fn test_malformed_tool_arguments_recovered() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_ok(tool_response(&[
            ("call_1", "web_search", r#"{"query": "ok"}"#),
            ("call_2", "broken", r#"{"query": unterminated"#),
            ("call_3", "lookup", r#"{"id": 7}"#),
        ]));
        let brain = Brain::with_transport(mock.clone());

        let result = brain.complete(user_params()).await.unwrap();
        let calls = result.tool_calls.unwrap();
        assert_eq!(calls.len(), 3);

        assert!(calls[0].error.is_none());
        assert!(!calls[0].arguments.is_empty());

        assert!(calls[1].arguments.is_empty());
        let error = calls[1].error.as_ref().unwrap();
        assert!(error.contains("Failed to parse arguments"));

        assert!(calls[2].error.is_none());
        assert_eq!(calls[2].arguments.get("id"), Some(&serde_json::json!(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retried_once() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_err(transient_error());
        mock.enqueue_ok(text_response("recovered"));
        let brain =
            Brain::with_transport(mock.clone()).with_retries(3, Duration::from_secs(1));

        let start = tokio::time::Instant::now();
        let result = brain.complete(user_params()).await.unwrap();
        assert_eq!(result.content.as_deref(), Some("recovered"));
        assert_eq!(mock.calls(), 2);
        // One failed attempt: one wait of 1 * base delay.
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_linear_in_attempt_number() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_err(transient_error());
        mock.enqueue_err(LlmError::RateLimited {
            provider: "openrouter".to_string(),
            retry_after_ms: 500,
        });
        mock.enqueue_ok(text_response("recovered"));
        let brain =
            Brain::with_transport(mock.clone()).with_retries(3, Duration::from_secs(1));

        let start = tokio::time::Instant::now();
        brain.complete(user_params()).await.unwrap();
        assert_eq!(mock.calls(), 3);
        // Waits of 1s then 2s: linear, not exponential.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_closes_generation_once() {
        let mock = Arc::new(MockCompletionTransport::new());
        for _ in 0..3 {
            mock.enqueue_err(transient_error());
        }
        let recorder = test_recorder();
        let brain = Brain::with_transport(mock.clone())
            .with_retries(3, Duration::from_secs(1))
            .with_recorder(recorder.clone());

        let err = brain.complete(user_params()).await.unwrap_err();
        match err {
            AtelierError::Llm(LlmError::RetriesExhausted { attempts, last_error }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("502"));
            }
            other => panic!("expected retries exhausted, got {:?}", other),
        }
        assert_eq!(mock.calls(), 3);
        assert_eq!(recorder.open_generations(), 0);
        assert_eq!(recorder.pending_events(), 1);
    }

    #[tokio::test]
    async fn test_non_retriable_error_fails_immediately() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_err(LlmError::InvalidResponse {
            provider: "openrouter".to_string(),
            reason: "not json".to_string(),
        });
        let recorder = test_recorder();
        let brain = Brain::with_transport(mock.clone()).with_recorder(recorder.clone());

        let err = brain.complete(user_params()).await.unwrap_err();
        match err {
            AtelierError::Llm(LlmError::CallFailed { reason }) => {
                assert!(reason.contains("Invalid response"));
            }
            other => panic!("expected call failure, got {:?}", other),
        }
        assert_eq!(mock.calls(), 1);
        assert_eq!(recorder.open_generations(), 0);
        assert_eq!(recorder.pending_events(), 1);
    }

    #[tokio::test]
    async fn test_empty_choices_is_a_call_failure() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_ok(ChatCompletionResponse {
            choices: Vec::new(),
            model: MODEL.to_string(),
            usage: Usage {
                prompt_tokens: 1,
                completion_tokens: None,
                total_tokens: 1,
            },
        });
        let brain = Brain::with_transport(mock.clone());

        let err = brain.complete(user_params()).await.unwrap_err();
        match err {
            AtelierError::Llm(LlmError::CallFailed { reason }) => {
                assert!(reason.contains("No completion in response"));
            }
            other => panic!("expected call failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_attaches_output_and_usage_to_generation() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_ok(text_response("Hello!"));
        let recorder = test_recorder();
        let brain = Brain::with_transport(mock.clone()).with_recorder(recorder.clone());

        brain.complete(user_params()).await.unwrap();

        assert_eq!(recorder.open_generations(), 0);
        let events = recorder.pending_snapshot();
        assert_eq!(events.len(), 1);
        let body = &events[0].body;
        assert_eq!(body.name, "llm_call_claude-3.5-sonnet");
        assert_eq!(body.model, MODEL);
        assert_eq!(body.usage, Some(TokenUsage::new(10, 8, 18)));
        let output = body.output.as_ref().unwrap();
        assert_eq!(output["content"], "Hello!");
        assert_eq!(
            body.model_parameters.get("temperature"),
            Some(&serde_json::json!(0.7))
        );
    }

    #[tokio::test]
    async fn test_untracked_call_opens_no_generation() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_ok(text_response("ok"));
        let recorder = test_recorder();
        let brain = Brain::with_transport(mock.clone()).with_recorder(recorder.clone());

        brain.complete(user_params().untracked()).await.unwrap();

        assert_eq!(recorder.open_generations(), 0);
        assert_eq!(recorder.pending_events(), 0);
    }

    #[tokio::test]
    async fn test_tracking_without_recorder_is_a_noop() {
        let mock = Arc::new(MockCompletionTransport::new());
        mock.enqueue_ok(text_response("ok"));
        let brain = Brain::with_transport(mock.clone());

        // track_generation defaults to true; with no recorder attached the
        // call proceeds without telemetry.
        let result = brain.complete(user_params()).await.unwrap();
        assert_eq!(result.content.as_deref(), Some("ok"));
    }

    #[test]
    fn test_default_generation_name_uses_model_tail() {
        assert_eq!(
            default_generation_name("anthropic/claude-3.5-sonnet"),
            "llm_call_claude-3.5-sonnet"
        );
        assert_eq!(default_generation_name("gpt-4o-mini"), "llm_call_gpt-4o-mini");
    }
}
