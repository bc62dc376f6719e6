// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat-completions endpoints.
//!
//! The API key travels with each call because it is per-tenant data. Every
//! call is a single attempt bounded by the configured timeout; the caller
//! treats any failure as "AI tier unavailable".

use std::time::Duration;

use chatplug_config::model::AiProviderConfig;
use chatplug_core::ChatplugError;
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// HTTP client for chat-completions requests.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl OpenAiClient {
    /// Creates a new client against the configured endpoint.
    pub fn new(config: &AiProviderConfig) -> Result<Self, ChatplugError> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ChatplugError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            request_timeout,
        })
    }

    /// Sends one chat-completions request with the given bearer key.
    pub async fn complete_chat(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse, ChatplugError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatplugError::Timeout {
                        duration: self.request_timeout,
                    }
                } else {
                    ChatplugError::Provider {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, model = request.model.as_str(), "completion response received");

        let body = response.text().await.map_err(|e| ChatplugError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(ChatplugError::Provider {
                message,
                source: None,
            });
        }

        serde_json::from_str(&body).map_err(|e| ChatplugError::Provider {
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str, timeout_secs: u64) -> OpenAiClient {
        OpenAiClient::new(&AiProviderConfig {
            api_base_url: base_url.to_string(),
            request_timeout_secs: timeout_secs,
            max_tokens: 64,
        })
        .unwrap()
    }

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            max_tokens: Some(64),
        }
    }

    fn success_body() -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hi there!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}
        })
    }

    #[tokio::test]
    async fn complete_chat_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 5);
        let response = client.complete_chat("sk-test", &test_request()).await.unwrap();

        assert_eq!(response.model, "gpt-4");
        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].message.content, "Hi there!");
        assert_eq!(response.usage.as_ref().unwrap().total_tokens, 12);
    }

    #[tokio::test]
    async fn auth_error_is_decoded() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        });
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(&error_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 5);
        let err = client
            .complete_chat("sk-bad", &test_request())
            .await
            .unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("invalid_request_error"), "got: {rendered}");
        assert!(rendered.contains("Incorrect API key"), "got: {rendered}");
    }

    #[tokio::test]
    async fn server_error_is_a_single_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .expect(1) // exactly one request: no retry on failure
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 5);
        let err = client
            .complete_chat("sk-test", &test_request())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatplugError::Provider { .. }));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 1);
        let err = client
            .complete_chat("sk-test", &test_request())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatplugError::Timeout { .. }));
    }
}
