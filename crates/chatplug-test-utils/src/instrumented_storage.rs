// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delegating storage wrapper with fetch counters.
//!
//! Wraps any `StorageAdapter` and counts how often each precedence tier is
//! consulted, so tests can verify short-circuit behavior ("the basic tier
//! was never fetched when an advanced rule matched") by call count.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use chatplug_core::traits::adapter::PluginAdapter;
use chatplug_core::traits::storage::StorageAdapter;
use chatplug_core::types::{
    AdapterType, AiSettings, ChangeSubscription, HealthStatus, Message, ReplyRule, Session,
    Table, WidgetSettings,
};
use chatplug_core::ChatplugError;

/// Counting pass-through around a real storage adapter.
pub struct InstrumentedStorage {
    inner: Arc<dyn StorageAdapter>,
    advanced_fetches: AtomicUsize,
    basic_fetches: AtomicUsize,
    ai_fetches: AtomicUsize,
    message_inserts: AtomicUsize,
}

impl InstrumentedStorage {
    pub fn new(inner: Arc<dyn StorageAdapter>) -> Self {
        Self {
            inner,
            advanced_fetches: AtomicUsize::new(0),
            basic_fetches: AtomicUsize::new(0),
            ai_fetches: AtomicUsize::new(0),
            message_inserts: AtomicUsize::new(0),
        }
    }

    pub fn advanced_fetches(&self) -> usize {
        self.advanced_fetches.load(Ordering::SeqCst)
    }

    pub fn basic_fetches(&self) -> usize {
        self.basic_fetches.load(Ordering::SeqCst)
    }

    pub fn ai_fetches(&self) -> usize {
        self.ai_fetches.load(Ordering::SeqCst)
    }

    pub fn message_inserts(&self) -> usize {
        self.message_inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for InstrumentedStorage {
    fn name(&self) -> &str {
        "instrumented-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ChatplugError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), ChatplugError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl StorageAdapter for InstrumentedStorage {
    async fn initialize(&self) -> Result<(), ChatplugError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), ChatplugError> {
        self.inner.close().await
    }

    async fn widget_settings(
        &self,
        tenant_id: &str,
    ) -> Result<Option<WidgetSettings>, ChatplugError> {
        self.inner.widget_settings(tenant_id).await
    }

    async fn upsert_widget_settings(
        &self,
        settings: &WidgetSettings,
    ) -> Result<(), ChatplugError> {
        self.inner.upsert_widget_settings(settings).await
    }

    async fn list_advanced_replies(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<ReplyRule>, ChatplugError> {
        self.advanced_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.list_advanced_replies(tenant_id).await
    }

    async fn list_auto_replies(&self, tenant_id: &str) -> Result<Vec<ReplyRule>, ChatplugError> {
        self.basic_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.list_auto_replies(tenant_id).await
    }

    async fn insert_advanced_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError> {
        self.inner.insert_advanced_reply(rule).await
    }

    async fn insert_auto_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError> {
        self.inner.insert_auto_reply(rule).await
    }

    async fn update_advanced_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError> {
        self.inner.update_advanced_reply(rule).await
    }

    async fn update_auto_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError> {
        self.inner.update_auto_reply(rule).await
    }

    async fn delete_advanced_reply(
        &self,
        tenant_id: &str,
        id: &str,
    ) -> Result<(), ChatplugError> {
        self.inner.delete_advanced_reply(tenant_id, id).await
    }

    async fn delete_auto_reply(&self, tenant_id: &str, id: &str) -> Result<(), ChatplugError> {
        self.inner.delete_auto_reply(tenant_id, id).await
    }

    async fn ai_settings(&self, tenant_id: &str) -> Result<Option<AiSettings>, ChatplugError> {
        self.ai_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.ai_settings(tenant_id).await
    }

    async fn upsert_ai_settings(&self, settings: &AiSettings) -> Result<(), ChatplugError> {
        self.inner.upsert_ai_settings(settings).await
    }

    async fn find_or_create_session(
        &self,
        tenant_id: &str,
        visitor_id: &str,
    ) -> Result<(Session, bool), ChatplugError> {
        self.inner.find_or_create_session(tenant_id, visitor_id).await
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, ChatplugError> {
        self.inner.get_session(id).await
    }

    async fn list_sessions(&self, tenant_id: &str) -> Result<Vec<Session>, ChatplugError> {
        self.inner.list_sessions(tenant_id).await
    }

    async fn set_session_live(&self, id: &str, live: bool) -> Result<(), ChatplugError> {
        self.inner.set_session_live(id, live).await
    }

    async fn insert_message(&self, msg: &Message) -> Result<Message, ChatplugError> {
        self.message_inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_message(msg).await
    }

    async fn messages_for_session(
        &self,
        session_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ChatplugError> {
        self.inner.messages_for_session(session_id, limit).await
    }

    fn subscribe(&self, table: Table) -> ChangeSubscription {
        self.inner.subscribe(table)
    }
}
