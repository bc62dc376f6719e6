// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Chatplug backend.
//!
//! Row types mirror the six logical tables of the widget backend. All
//! timestamps are RFC 3339 UTC strings with microsecond precision, so
//! lexicographic order equals chronological order.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::broadcast;
use tracing::warn;

use crate::error::ChatplugError;

/// Keyword matching strategy for a reply rule.
///
/// Serialized with the wire names used by the dashboard and stored rows
/// (`word_match`, `fuzzy_match`, `regex_match`, `synonym_match`). Unknown
/// strings fail deserialization, which rejects them at the write path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum MatchingType {
    /// Case-insensitive substring containment.
    #[strum(serialize = "word_match")]
    #[serde(rename = "word_match")]
    Word,
    /// Levenshtein edit distance against the whole message.
    #[strum(serialize = "fuzzy_match")]
    #[serde(rename = "fuzzy_match")]
    Fuzzy,
    /// Keyword compiled as a case-insensitive regular expression.
    #[strum(serialize = "regex_match")]
    #[serde(rename = "regex_match")]
    Regex,
    /// Currently an alias for `Word`; no thesaurus expansion is wired in.
    #[strum(serialize = "synonym_match")]
    #[serde(rename = "synonym_match")]
    Synonym,
}

/// Author of a chat message row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    /// The business side: welcome messages and live human agents.
    BusinessUser,
    /// The anonymous end-user chatting through the embedded widget.
    Visitor,
    /// AI completion replies.
    Ai,
    /// Replies produced by an advanced rule.
    AdvancedReply,
    /// Replies produced by a basic rule or the static fallback.
    AutoReply,
}

/// Per-tenant widget branding, including the welcome message seeded into
/// new sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSettings {
    pub tenant_id: String,
    pub business_name: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub welcome_message: String,
    pub sales_representative: String,
    pub created_at: String,
}

/// A keyword-triggered canned-response rule (advanced or basic variant).
///
/// `keywords` preserves insertion order; within a rule, keywords are
/// evaluated in that order. `is_url` is only meaningful for advanced rules
/// and is always false for basic rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRule {
    pub id: String,
    pub tenant_id: String,
    pub keywords: Vec<String>,
    pub matching_type: MatchingType,
    pub response: String,
    pub is_url: bool,
    pub created_at: String,
}

impl ReplyRule {
    /// Write-time invariants: non-empty keyword list, no blank keywords,
    /// non-empty response. Matching never re-checks these.
    pub fn validate(&self) -> Result<(), ChatplugError> {
        if self.keywords.is_empty() {
            return Err(ChatplugError::InvalidRule {
                reason: "keyword list must not be empty".into(),
            });
        }
        if self.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ChatplugError::InvalidRule {
                reason: "keywords must not be blank".into(),
            });
        }
        if self.response.trim().is_empty() {
            return Err(ChatplugError::InvalidRule {
                reason: "response must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Per-tenant AI fallback configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    pub tenant_id: String,
    pub is_enabled: bool,
    pub api_key: String,
    pub model: String,
    pub context_info: String,
    pub created_at: String,
}

impl AiSettings {
    /// Write-time invariant: enabling the AI tier requires an API key.
    pub fn validate(&self) -> Result<(), ChatplugError> {
        if self.is_enabled && self.api_key.trim().is_empty() {
            return Err(ChatplugError::Config(
                "ai_settings: is_enabled requires a non-empty api_key".into(),
            ));
        }
        Ok(())
    }

    /// Whether the resolver may attempt the AI tier for this tenant.
    pub fn is_usable(&self) -> bool {
        self.is_enabled && !self.api_key.trim().is_empty()
    }
}

/// One visitor conversation. `is_active == true` means a human agent has
/// taken the session over (live mode) and automated resolution is
/// suppressed; sessions are created with the flag cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub tenant_id: String,
    pub visitor_id: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// An append-only chat message row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub sender_type: SenderType,
    pub message: String,
    pub created_at: String,
}

// --- Provider types ---

/// One transcript entry handed to the AI provider as conversation prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub sender: SenderType,
    pub text: String,
}

/// A completion request carrying the tenant's own credentials and grounding
/// context. The provider makes a single attempt; retries are the caller's
/// concern (the resolver routes failure to the static fallback instead).
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub api_key: String,
    pub model: String,
    pub context_info: String,
    pub conversation: Vec<TranscriptEntry>,
    pub max_tokens: u32,
}

/// A completion produced by an AI provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub model: String,
}

// --- Adapter plumbing ---

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Provider,
}

// --- Change feed ---

/// The six logical tables covered by the change feed, serialized with their
/// table names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Table {
    WidgetSettings,
    AutoReplies,
    AdvancedReplies,
    AiSettings,
    ChatSessions,
    ChatMessages,
}

/// Kind of row change carried by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// A single row change delivered by the storage change feed.
///
/// `row` is the full row serialized as JSON, mirroring the payload shape of
/// the hosted backend's push subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub op: ChangeOp,
    pub row: serde_json::Value,
}

/// A live subscription to one table of the change feed.
///
/// Events arrive in delivery order, which is not necessarily causal order;
/// callers needing exact state must re-fetch on demand. Dropping the
/// subscription cancels it.
pub struct ChangeSubscription {
    rx: broadcast::Receiver<ChangeEvent>,
    table: Table,
    session_id: Option<String>,
}

impl ChangeSubscription {
    pub fn new(rx: broadcast::Receiver<ChangeEvent>, table: Table) -> Self {
        Self {
            rx,
            table,
            session_id: None,
        }
    }

    /// Narrow this subscription to rows belonging to one session. For
    /// `chat_sessions` the filter applies to the row's own `id`.
    pub fn with_session_filter(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Receive the next matching event. Returns `None` once the feed is
    /// closed. Missed events after a slow consumer lags are skipped with a
    /// warning rather than terminating the subscription.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if event.table != self.table {
                        continue;
                    }
                    if !self.matches_filter(&event) {
                        continue;
                    }
                    return Some(event);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, table = %self.table, "change feed subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn matches_filter(&self, event: &ChangeEvent) -> bool {
        let Some(wanted) = &self.session_id else {
            return true;
        };
        let key = match self.table {
            Table::ChatSessions => "id",
            _ => "session_id",
        };
        event.row.get(key).and_then(|v| v.as_str()) == Some(wanted.as_str())
    }
}
