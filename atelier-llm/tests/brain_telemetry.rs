//! End-to-end exercise of the completion caller with telemetry attached:
//! a tool-use round trip driven through the public API against a scripted
//! transport.

use atelier_core::{AtelierError, LlmError, Message, Thread};
use atelier_llm::types::{
    ChatCompletionResponse, ChatMessage, Choice, FunctionCall, ResponseMessage, ToolCallPayload,
    ToolSpec, Usage,
};
use atelier_llm::{Brain, CompletionParams, MockCompletionTransport};
use atelier_telemetry::{Recorder, TelemetryConfig};
use std::sync::Arc;

const MODEL: &str = "anthropic/claude-3.5-sonnet";

fn tool_call_response() -> ChatCompletionResponse {
    ChatCompletionResponse {
        choices: vec![Choice {
            message: ResponseMessage {
                content: None,
                tool_calls: Some(vec![ToolCallPayload {
                    id: "call_123".to_string(),
                    function: FunctionCall {
                        name: "web_search".to_string(),
                        arguments: r#"{"query": "latest AI news"}"#.to_string(),
                    },
                }]),
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
            prompt_tokens: 40,
            completion_tokens: Some(20),
            total_tokens: 60,
        },
    }
}

#[tokio::test]
async fn tool_use_round_trip_records_one_generation_per_call() {
    let mock = Arc::new(MockCompletionTransport::new());
    mock.enqueue_ok(tool_call_response());
    mock.enqueue_ok(text_response("Here is a summary of the latest AI news."));

    let recorder = Arc::new(Recorder::new(TelemetryConfig::new("pk-test", "sk-test")));
    let brain = Brain::with_transport(mock.clone()).with_recorder(recorder.clone());

    let mut thread = Thread::new("thread-1").with_user("user-7");
    thread.push(Message::user("What is new in AI?"));

    // First call: the model asks for a tool.
    let tools = vec![ToolSpec::function(
        "web_search",
        "Search the web",
        serde_json::json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"]
        }),
    )];
    let first = brain
        .complete(
            CompletionParams::new(vec![ChatMessage::user("What is new in AI?")], MODEL)
                .with_tools(tools),
        )
        .await
        .unwrap();

    assert!(first.has_tool_calls());
    let call = &first.tool_calls.as_ref().unwrap()[0];
    assert_eq!(call.name, "web_search");
    assert_eq!(
        call.arguments.get("query"),
        Some(&serde_json::json!("latest AI news"))
    );

    // Record the tool exchange on the thread.
    thread.push(Message::tool_call(
        call.name.clone(),
        call.arguments.clone(),
        call.id.clone(),
    ));
    thread.push(Message::tool_result(
        call.name.clone(),
        serde_json::json!(["story one", "story two"]),
        call.id.clone(),
        true,
    ));

    // Second call: the model answers with text.
    let second = brain
        .complete(CompletionParams::new(
            vec![
                ChatMessage::user("What is new in AI?"),
                ChatMessage::assistant("(tool results attached)"),
            ],
            MODEL,
        ))
        .await
        .unwrap();

    assert!(!second.has_tool_calls());
    thread.push(Message::assistant_with_usage(
        second.content.clone().unwrap(),
        second.model.clone(),
        second.usage,
    ));

    assert_eq!(thread.len(), 4);
    assert_eq!(mock.calls(), 2);

    // One generation per completion call, all closed, none leaked.
    assert_eq!(recorder.open_generations(), 0);
    let events = recorder.pending_snapshot();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.body.end_time.is_some()));
    assert_eq!(events[0].body.usage.unwrap().total_tokens, 27);
    assert_eq!(events[1].body.usage.unwrap().total_tokens, 60);
}

#[tokio::test]
async fn telemetry_delivery_failure_does_not_affect_call_results() {
    let mock = Arc::new(MockCompletionTransport::new());
    mock.enqueue_ok(text_response("fine"));

    // Unreachable collector: recording still works, only flush fails.
    let recorder = Arc::new(Recorder::new(
        TelemetryConfig::new("pk-test", "sk-test").with_host("http://127.0.0.1:9"),
    ));
    let brain = Brain::with_transport(mock).with_recorder(recorder.clone());

    let result = brain
        .complete(CompletionParams::new(
            vec![ChatMessage::user("hello")],
            MODEL,
        ))
        .await
        .unwrap();
    assert_eq!(result.content.as_deref(), Some("fine"));

    assert_eq!(recorder.pending_events(), 1);
    assert!(recorder.flush().await.is_err());
}

#[tokio::test]
async fn exhausted_retries_surface_one_error_kind() {
    let mock = Arc::new(MockCompletionTransport::new());
    for _ in 0..2 {
        mock.enqueue_err(LlmError::RateLimited {
            provider: "openrouter".to_string(),
            retry_after_ms: 100,
        });
    }
    let brain = Brain::with_transport(mock.clone())
        .with_retries(2, std::time::Duration::from_millis(1));

    let err = brain
        .complete(CompletionParams::new(
            vec![ChatMessage::user("hello")],
            MODEL,
        ))
        .await
        .unwrap_err();

    // Callers see a single completion-failure kind; the cause is only in
    // the message text.
    match err {
        AtelierError::Llm(LlmError::RetriesExhausted { attempts, last_error }) => {
            assert_eq!(attempts, 2);
            assert!(last_error.contains("Rate limited"));
        }
        other => panic!("expected retries exhausted, got {:?}", other),
    }
    assert_eq!(mock.calls(), 2);
}
