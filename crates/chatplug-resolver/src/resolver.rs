// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The reply resolver: picks one of four response channels for an incoming
//! visitor message and appends exactly one reply row.
//!
//! Precedence is fixed: advanced rules, then basic rules, then the AI
//! fallback, then the static fallback. First match wins; later tiers are
//! never evaluated. Resolution always terminates in one of the four
//! outcomes — tier failures degrade, they do not abort.

use std::sync::Arc;
use std::time::Duration;

use chatplug_config::model::{AiProviderConfig, ResolverConfig};
use chatplug_core::types::{
    AiSettings, CompletionRequest, Message, SenderType, TranscriptEntry,
};
use chatplug_core::{ChatplugError, ProviderAdapter, StorageAdapter};
use tracing::{debug, info, warn};

use crate::matcher;
use crate::store::RuleStore;

/// Which precedence tier produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyChannel {
    Advanced,
    Basic,
    Ai,
    Fallback,
}

impl std::fmt::Display for ReplyChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyChannel::Advanced => write!(f, "advanced"),
            ReplyChannel::Basic => write!(f, "basic"),
            ReplyChannel::Ai => write!(f, "ai"),
            ReplyChannel::Fallback => write!(f, "fallback"),
        }
    }
}

/// The outgoing automated reply.
///
/// `sender` is what gets written to the message row. The static fallback is
/// written as `auto_reply` (matching the dashboard's rendering of the
/// original system), so `channel` is what distinguishes it for callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub channel: ReplyChannel,
    pub sender: SenderType,
    pub text: String,
}

/// Tunables lifted out of the service configuration.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub fallback_reply: String,
    pub ai_timeout: Duration,
    pub max_tokens: u32,
    pub transcript_limit: i64,
}

impl ResolverOptions {
    pub fn from_config(resolver: &ResolverConfig, ai: &AiProviderConfig) -> Self {
        Self {
            fallback_reply: resolver.fallback_reply.clone(),
            ai_timeout: Duration::from_secs(ai.request_timeout_secs),
            max_tokens: ai.max_tokens,
            transcript_limit: resolver.transcript_limit,
        }
    }
}

/// The decision procedure for one tenant + one session at a time.
pub struct ReplyResolver {
    store: RuleStore,
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn ProviderAdapter>,
    options: ResolverOptions,
}

impl ReplyResolver {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            store: RuleStore::new(Arc::clone(&storage)),
            storage,
            provider,
            options,
        }
    }

    /// Run one resolution pass for a visitor message and append the winning
    /// reply.
    ///
    /// Preconditions are contract errors, not recoverable states: the
    /// session must exist (`SessionNotFound`) and must not be in live mode
    /// (`SessionLive`). Nothing is appended when a precondition fails.
    /// Otherwise exactly one automated message row is written.
    pub async fn resolve(
        &self,
        tenant_id: &str,
        session_id: &str,
        visitor_message: &str,
    ) -> Result<Reply, ChatplugError> {
        let session = self
            .storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| ChatplugError::SessionNotFound {
                id: session_id.to_string(),
            })?;
        if session.is_active {
            return Err(ChatplugError::SessionLive {
                id: session_id.to_string(),
            });
        }

        let reply = self.pick_reply(tenant_id, session_id, visitor_message).await;

        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        self.storage
            .insert_message(&Message {
                id: uuid::Uuid::new_v4().to_string(),
                session_id: session_id.to_string(),
                sender_type: reply.sender,
                message: reply.text.clone(),
                created_at: now,
            })
            .await?;

        info!(
            tenant_id,
            session_id,
            channel = %reply.channel,
            "resolution pass complete"
        );
        Ok(reply)
    }

    /// Walk the precedence chain. Always yields a reply.
    async fn pick_reply(&self, tenant_id: &str, session_id: &str, message: &str) -> Reply {
        for rule in self.store.advanced_rules(tenant_id).await {
            if rule.keywords.is_empty() {
                warn!(rule_id = rule.id.as_str(), "skipping rule with empty keyword list");
                continue;
            }
            if matcher::matches(message, &rule.keywords, rule.matching_type) {
                debug!(rule_id = rule.id.as_str(), "advanced rule matched");
                return Reply {
                    channel: ReplyChannel::Advanced,
                    sender: SenderType::AdvancedReply,
                    text: rule.response,
                };
            }
        }

        for rule in self.store.basic_rules(tenant_id).await {
            if rule.keywords.is_empty() {
                warn!(rule_id = rule.id.as_str(), "skipping rule with empty keyword list");
                continue;
            }
            if matcher::matches(message, &rule.keywords, rule.matching_type) {
                debug!(rule_id = rule.id.as_str(), "basic rule matched");
                return Reply {
                    channel: ReplyChannel::Basic,
                    sender: SenderType::AutoReply,
                    text: rule.response,
                };
            }
        }

        if let Some(ai) = self.store.ai_settings(tenant_id).await
            && ai.is_usable()
        {
            match self.complete_ai(&ai, session_id, message).await {
                Ok(text) if !text.trim().is_empty() => {
                    return Reply {
                        channel: ReplyChannel::Ai,
                        sender: SenderType::Ai,
                        text,
                    };
                }
                Ok(_) => {
                    warn!(session_id, "AI completion was empty, falling back");
                }
                Err(e) => {
                    warn!(session_id, error = %e, "AI completion failed, falling back");
                }
            }
        }

        Reply {
            channel: ReplyChannel::Fallback,
            sender: SenderType::AutoReply,
            text: self.options.fallback_reply.clone(),
        }
    }

    /// One bounded attempt against the AI provider, grounded on the
    /// tenant's context info and the recent transcript.
    async fn complete_ai(
        &self,
        ai: &AiSettings,
        session_id: &str,
        visitor_message: &str,
    ) -> Result<String, ChatplugError> {
        let transcript = match self
            .storage
            .messages_for_session(session_id, Some(self.options.transcript_limit))
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                warn!(session_id, error = %e, "transcript fetch failed, sending message alone");
                Vec::new()
            }
        };

        let mut conversation: Vec<TranscriptEntry> = transcript
            .into_iter()
            .map(|m| TranscriptEntry {
                sender: m.sender_type,
                text: m.message,
            })
            .collect();
        // The triggering message is normally the transcript tail already;
        // include it explicitly when it is not.
        let tail_is_message = conversation
            .last()
            .is_some_and(|e| e.sender == SenderType::Visitor && e.text == visitor_message);
        if !tail_is_message {
            conversation.push(TranscriptEntry {
                sender: SenderType::Visitor,
                text: visitor_message.to_string(),
            });
        }

        let request = CompletionRequest {
            api_key: ai.api_key.clone(),
            model: ai.model.clone(),
            context_info: ai.context_info.clone(),
            conversation,
            max_tokens: self.options.max_tokens,
        };

        match tokio::time::timeout(self.options.ai_timeout, self.provider.complete(request)).await
        {
            Ok(Ok(response)) => Ok(response.text),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ChatplugError::Timeout {
                duration: self.options.ai_timeout,
            }),
        }
    }
}
