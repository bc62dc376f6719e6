// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock AI provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured
//! completions, an atomic call counter (for asserting that a tier was or
//! was not consulted), and optional forced failure or delay.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use chatplug_core::traits::adapter::PluginAdapter;
use chatplug_core::traits::provider::ProviderAdapter;
use chatplug_core::types::{
    AdapterType, CompletionRequest, CompletionResponse, HealthStatus,
};
use chatplug_core::ChatplugError;

/// A mock AI provider that returns pre-configured completions.
///
/// Completions are popped from a FIFO queue. When the queue is empty, a
/// default "mock completion" text is returned.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    calls: AtomicUsize,
    fail: bool,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: AtomicUsize::new(0),
            fail: false,
            delay: None,
        }
    }

    /// Create a mock provider pre-loaded with the given completions.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Self::new()
        }
    }

    /// Create a mock provider whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Delay every completion, for exercising caller-side timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completion calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Add a completion to the end of the queue.
    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock completion".to_string())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ChatplugError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ChatplugError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ChatplugError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ChatplugError::Provider {
                message: "mock provider failure".into(),
                source: None,
            });
        }

        Ok(CompletionResponse {
            text: self.next_response().await,
            model: request.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            api_key: "sk-test".into(),
            model: "test-model".into(),
            context_info: String::new(),
            conversation: vec![],
            max_tokens: 64,
        }
    }

    #[tokio::test]
    async fn queued_responses_returned_in_order_then_default() {
        let provider =
            MockProvider::with_responses(vec!["first".to_string(), "second".to_string()]);

        assert_eq!(provider.complete(request()).await.unwrap().text, "first");
        assert_eq!(provider.complete(request()).await.unwrap().text, "second");
        assert_eq!(
            provider.complete(request()).await.unwrap().text,
            "mock completion"
        );
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn failing_provider_counts_calls() {
        let provider = MockProvider::failing();
        assert!(provider.complete(request()).await.is_err());
        assert_eq!(provider.call_count(), 1);
    }
}
