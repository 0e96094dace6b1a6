//! OpenAI-compatible provider implementation
//!
//! Works with any chat-completions API that follows the OpenAI wire format
//! (Groq, OpenAI, local vLLM/Ollama deployments).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use repolens_core::config::LlmConfig;

use crate::domain::error::LlmError;
use crate::domain::messages::{CompletionRequest, CompletionResponse, StopReason, Usage};
use crate::domain::provider::{LlmProvider, ProviderInfo};

/// OpenAI-compatible provider
pub struct OpenAiCompatProvider {
    client: Client,
    base_url: String,
    model: String,
    timeout_seconds: u64,
}

impl OpenAiCompatProvider {
    pub fn new(config: &LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to build HTTP client with custom timeout, using default client");
                Client::new()
            });

        Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.default_model.clone(),
            timeout_seconds: config.timeout_seconds,
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn to_wire_request(&self, request: &CompletionRequest) -> WireRequest {
        WireRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: request
                .messages
                .iter()
                .map(|msg| WireMessage {
                    role: msg.role.as_str().to_string(),
                    content: Some(msg.content.clone()),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            stream: false,
        }
    }

    fn parse_wire_response(response: WireResponse) -> CompletionResponse {
        let choice = response.choices.into_iter().next();

        let text = choice
            .as_ref()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .unwrap_or_default();

        let stop_reason = choice
            .as_ref()
            .and_then(|c| c.finish_reason.as_deref())
            .map(|r| match r {
                "stop" => StopReason::EndTurn,
                "length" => StopReason::MaxTokens,
                "content_filter" => StopReason::ContentFilter,
                _ => StopReason::Other,
            })
            .unwrap_or(StopReason::Other);

        let usage = response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        CompletionResponse {
            id: response.id,
            model: response.model,
            text,
            stop_reason,
            usage,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            id: "openai_compat",
            name: "OpenAI-compatible",
        }
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        request: CompletionRequest,
        credential: &str,
    ) -> Result<CompletionResponse, LlmError> {
        if credential.trim().is_empty() {
            return Err(LlmError::MissingCredential);
        }

        let wire_request = self.to_wire_request(&request);
        debug!(model = %wire_request.model, "Sending request to chat-completions API");

        let response = self
            .client
            .post(self.chat_url())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", credential))
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        seconds: self.timeout_seconds,
                    }
                } else {
                    LlmError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                429 => LlmError::rate_limited(text),
                401 | 403 => LlmError::auth(text),
                s if s >= 500 => LlmError::ServiceUnavailable(text),
                _ => {
                    error!(status = %status, "Chat-completions API error: {}", text);
                    LlmError::InvalidResponse(format!("API error {}: {}", status, text))
                }
            });
        }

        let wire_response: WireResponse = response.json().await?;
        Ok(Self::parse_wire_response(wire_response))
    }
}

// === Wire types ===

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: Option<WireMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::messages::Message;

    fn test_provider() -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(&LlmConfig {
            api_url: "https://api.example.com/v1/".to_string(),
            ..LlmConfig::default()
        })
    }

    #[test]
    fn test_chat_url_strips_trailing_slash() {
        let provider = test_provider();
        assert_eq!(
            provider.chat_url(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_wire_request_uses_default_model() {
        let provider = test_provider();
        let request = CompletionRequest::new().with_message(Message::user("hi"));
        let wire = provider.to_wire_request(&request);
        assert_eq!(wire.model, provider.default_model());
        assert!(!wire.stream);
    }

    #[tokio::test]
    async fn test_empty_credential_fails_without_network() {
        let provider = test_provider();
        let request = CompletionRequest::new().with_user("ping");
        let err = provider.complete(request, "  ").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingCredential));
    }

    #[test]
    fn test_parse_wire_response() {
        let wire: WireResponse = serde_json::from_str(
            r#"{
                "id": "resp-1",
                "model": "test-model",
                "choices": [{"message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
            }"#,
        )
        .unwrap();

        let response = OpenAiCompatProvider::parse_wire_response(wire);
        assert_eq!(response.text, "hello");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total_tokens, 7);
    }
}
