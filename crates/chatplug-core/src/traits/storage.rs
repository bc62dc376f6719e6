// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the widget backend's persistence collaborator.
//!
//! The trait exposes exactly the primitives the core needs against the six
//! logical tables: point lookup, filtered ordered list, insert, update,
//! delete, and a push subscription delivering row-change events.

use async_trait::async_trait;

use crate::error::ChatplugError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AiSettings, ChangeSubscription, Message, ReplyRule, Session, Table, WidgetSettings,
};

/// Adapter for the tenant-scoped persistence backend.
///
/// All list operations are tenant-filtered; the core never reads across
/// tenants. Rule lists are returned in stored order (most recently created
/// first), which is the order the resolver evaluates them in.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection setup).
    async fn initialize(&self) -> Result<(), ChatplugError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), ChatplugError>;

    // --- Widget settings ---

    async fn widget_settings(
        &self,
        tenant_id: &str,
    ) -> Result<Option<WidgetSettings>, ChatplugError>;

    async fn upsert_widget_settings(
        &self,
        settings: &WidgetSettings,
    ) -> Result<(), ChatplugError>;

    // --- Reply rules ---

    async fn list_advanced_replies(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<ReplyRule>, ChatplugError>;

    async fn list_auto_replies(&self, tenant_id: &str) -> Result<Vec<ReplyRule>, ChatplugError>;

    /// Inserts an advanced rule; write-time invariants are enforced here,
    /// never during matching.
    async fn insert_advanced_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError>;

    async fn insert_auto_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError>;

    async fn update_advanced_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError>;

    async fn update_auto_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError>;

    async fn delete_advanced_reply(&self, tenant_id: &str, id: &str)
        -> Result<(), ChatplugError>;

    async fn delete_auto_reply(&self, tenant_id: &str, id: &str) -> Result<(), ChatplugError>;

    // --- AI settings ---

    async fn ai_settings(&self, tenant_id: &str) -> Result<Option<AiSettings>, ChatplugError>;

    async fn upsert_ai_settings(&self, settings: &AiSettings) -> Result<(), ChatplugError>;

    // --- Sessions ---

    /// Returns the most recent session for the tenant+visitor pair, creating
    /// one (with `is_active = false`) if none exists. Lookup and create run
    /// as a single logical operation so concurrent callers for the same
    /// visitor observe at most one new session. The boolean is true when a
    /// session was created.
    async fn find_or_create_session(
        &self,
        tenant_id: &str,
        visitor_id: &str,
    ) -> Result<(Session, bool), ChatplugError>;

    async fn get_session(&self, id: &str) -> Result<Option<Session>, ChatplugError>;

    /// Tenant's sessions, most recently active first.
    async fn list_sessions(&self, tenant_id: &str) -> Result<Vec<Session>, ChatplugError>;

    /// Sets or clears the live-mode flag.
    async fn set_session_live(&self, id: &str, live: bool) -> Result<(), ChatplugError>;

    // --- Messages ---

    /// Appends a message and bumps the parent session's `updated_at` in the
    /// same operation. The stored `created_at` is guaranteed strictly greater
    /// than every earlier message in the session.
    async fn insert_message(&self, msg: &Message) -> Result<Message, ChatplugError>;

    /// Session transcript in chronological order.
    async fn messages_for_session(
        &self,
        session_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ChatplugError>;

    // --- Change feed ---

    /// Subscribes to row-change events for one table. Delivery order is not
    /// necessarily causal order; re-fetch on demand where exact state
    /// matters.
    fn subscribe(&self, table: Table) -> ChangeSubscription;
}
