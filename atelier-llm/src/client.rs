//! Gateway HTTP client

use crate::config::GatewayConfig;
use crate::types::{ApiError, ChatCompletionRequest, ChatCompletionResponse};
use crate::CompletionTransport;
use async_trait::async_trait;
use atelier_core::{AtelierResult, LlmError};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

/// Provider tag used in error messages.
pub(crate) const PROVIDER: &str = "openrouter";

/// HTTP client for the OpenAI-compatible completion gateway.
pub struct GatewayClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GatewayClient {
    /// Create a new gateway client.
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        }
    }

    /// Make an API request against the gateway.
    pub async fn request<Req: Serialize, Res: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> AtelierResult<Res> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                status: 0,
                message: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        let retry_after_ms = parse_retry_after_ms(response.headers()).unwrap_or(0);

        if status.is_success() {
            response.json().await.map_err(|e| {
                LlmError::InvalidResponse {
                    provider: PROVIDER.to_string(),
                    reason: format!("Failed to parse response: {}", e),
                }
                .into()
            })
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let error_msg = if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                api_error.error.message
            } else {
                error_text
            };

            Err(match status {
                StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited {
                    provider: PROVIDER.to_string(),
                    retry_after_ms,
                },
                _ => LlmError::RequestFailed {
                    provider: PROVIDER.to_string(),
                    status: status.as_u16() as i32,
                    message: error_msg,
                },
            }
            .into())
        }
    }
}

#[async_trait]
impl CompletionTransport for GatewayClient {
    async fn chat(
        &self,
        request: &ChatCompletionRequest,
    ) -> AtelierResult<ChatCompletionResponse> {
        self.request("chat/completions", request).await
    }
}

fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<i64> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<f64>().ok())
        .map(|seconds| (seconds * 1000.0) as i64)
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
