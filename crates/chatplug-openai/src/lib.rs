// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible completion provider adapter for Chatplug.
//!
//! Turns a [`CompletionRequest`] — tenant API key, model choice, grounding
//! context, and a conversation prefix — into one chat-completions call.

pub mod client;
pub mod types;

use async_trait::async_trait;

use chatplug_config::model::AiProviderConfig;
use chatplug_core::traits::adapter::PluginAdapter;
use chatplug_core::traits::provider::ProviderAdapter;
use chatplug_core::types::{
    AdapterType, CompletionRequest, CompletionResponse, HealthStatus, SenderType,
};
use chatplug_core::ChatplugError;

pub use client::OpenAiClient;
use types::{ChatMessage, ChatRequest};

/// Provider adapter over [`OpenAiClient`].
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    pub fn new(config: &AiProviderConfig) -> Result<Self, ChatplugError> {
        Ok(Self {
            client: OpenAiClient::new(config)?,
        })
    }
}

/// Build the chat message list: a system prompt grounded on the tenant's
/// context info, followed by the conversation prefix. Visitor messages map
/// to the `user` role; everything else (welcome messages, rule replies,
/// earlier AI replies, human agents) speaks as `assistant`.
fn build_messages(request: &CompletionRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(request.conversation.len() + 1);

    let system = if request.context_info.trim().is_empty() {
        "You are a helpful assistant replying to visitors in a business's website \
         chat widget. Keep replies short and friendly."
            .to_string()
    } else {
        format!(
            "You are a helpful assistant replying to visitors in a business's website \
             chat widget. Keep replies short and friendly. Business information: {}",
            request.context_info
        )
    };
    messages.push(ChatMessage {
        role: "system".into(),
        content: system,
    });

    for entry in &request.conversation {
        let role = match entry.sender {
            SenderType::Visitor => "user",
            _ => "assistant",
        };
        messages.push(ChatMessage {
            role: role.into(),
            content: entry.text.clone(),
        });
    }

    messages
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ChatplugError> {
        // Stateless client; credentials are per-tenant so there is nothing
        // to probe without a tenant context.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ChatplugError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ChatplugError> {
        let chat_request = ChatRequest {
            model: request.model.clone(),
            messages: build_messages(&request),
            max_tokens: Some(request.max_tokens),
        };

        let response = self
            .client
            .complete_chat(&request.api_key, &chat_request)
            .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ChatplugError::Provider {
                message: "completion response had no choices".into(),
                source: None,
            })?;

        let model = if response.model.is_empty() {
            request.model
        } else {
            response.model
        };

        Ok(CompletionResponse { text, model })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatplug_core::types::TranscriptEntry;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_request() -> CompletionRequest {
        CompletionRequest {
            api_key: "sk-test".into(),
            model: "gpt-3.5-turbo".into(),
            context_info: "We sell office chairs.".into(),
            conversation: vec![
                TranscriptEntry {
                    sender: SenderType::BusinessUser,
                    text: "Hello! How can I help you today?".into(),
                },
                TranscriptEntry {
                    sender: SenderType::Visitor,
                    text: "Do you ship to France?".into(),
                },
            ],
            max_tokens: 64,
        }
    }

    #[test]
    fn system_prompt_carries_context_info() {
        let messages = build_messages(&completion_request());
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("We sell office chairs."));
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[2].content, "Do you ship to France?");
    }

    #[test]
    fn empty_context_still_yields_a_system_prompt() {
        let mut request = completion_request();
        request.context_info = "  ".into();
        let messages = build_messages(&request);
        assert_eq!(messages[0].role, "system");
        assert!(!messages[0].content.contains("Business information"));
    }

    #[tokio::test]
    async fn provider_round_trip() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Yes, we ship EU-wide."},
                "finish_reason": "stop"
            }]
        });
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 64
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&AiProviderConfig {
            api_base_url: server.uri(),
            request_timeout_secs: 5,
            max_tokens: 64,
        })
        .unwrap();

        let response = provider.complete(completion_request()).await.unwrap();
        assert_eq!(response.text, "Yes, we ship EU-wide.");
        assert_eq!(response.model, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn empty_choices_is_a_provider_error() {
        let server = MockServer::start().await;
        let body = serde_json::json!({"model": "gpt-3.5-turbo", "choices": []});
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&AiProviderConfig {
            api_base_url: server.uri(),
            request_timeout_secs: 5,
            max_tokens: 64,
        })
        .unwrap();

        let err = provider.complete(completion_request()).await.unwrap_err();
        assert!(matches!(err, ChatplugError::Provider { .. }));
    }
}
