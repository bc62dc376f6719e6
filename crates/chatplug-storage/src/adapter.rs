// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The SQLite-backed [`StorageAdapter`] implementation.
//!
//! Thin orchestration over the query modules: every successful write also
//! publishes a change-feed event, mirroring the hosted backend's realtime
//! notifications.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use chatplug_config::model::StorageConfig;
use chatplug_core::traits::adapter::PluginAdapter;
use chatplug_core::traits::storage::StorageAdapter;
use chatplug_core::types::{
    AdapterType, AiSettings, ChangeOp, ChangeSubscription, HealthStatus, Message, ReplyRule,
    Session, Table, WidgetSettings,
};
use chatplug_core::ChatplugError;

use crate::database::Database;
use crate::events::ChangeFeed;
use crate::queries::rules::RuleKind;
use crate::queries::{ai_settings, messages, rules, sessions, widget_settings};

/// Row counts used by the `status` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub sessions: i64,
    pub messages: i64,
    pub auto_replies: i64,
    pub advanced_replies: i64,
}

/// SQLite persistence adapter for the widget backend.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
    feed: ChangeFeed,
}

impl SqliteStorage {
    /// Create an unopened adapter; `initialize` opens the database and runs
    /// migrations.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            feed: ChangeFeed::new(),
        }
    }

    fn db(&self) -> Result<&Database, ChatplugError> {
        self.db
            .get()
            .ok_or_else(|| ChatplugError::Internal("storage used before initialize".into()))
    }

    /// Row counts across the main tables.
    pub async fn stats(&self) -> Result<StorageStats, ChatplugError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                let count = |conn: &rusqlite::Connection, table: &str| -> rusqlite::Result<i64> {
                    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                        row.get(0)
                    })
                };
                Ok(StorageStats {
                    sessions: count(conn, "chat_sessions")?,
                    messages: count(conn, "chat_messages")?,
                    auto_replies: count(conn, "auto_replies")?,
                    advanced_replies: count(conn, "advanced_replies")?,
                })
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ChatplugError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let probe = db
            .connection()
            .call(|conn| -> rusqlite::Result<()> {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
                Ok(())
            })
            .await;
        match probe {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), ChatplugError> {
        self.close().await
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ChatplugError> {
        self.db
            .get_or_try_init(|| {
                Database::open_with_options(&self.config.database_path, self.config.wal_mode)
            })
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ChatplugError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
        }
        Ok(())
    }

    async fn widget_settings(
        &self,
        tenant_id: &str,
    ) -> Result<Option<WidgetSettings>, ChatplugError> {
        widget_settings::widget_settings(self.db()?, tenant_id).await
    }

    async fn upsert_widget_settings(
        &self,
        settings: &WidgetSettings,
    ) -> Result<(), ChatplugError> {
        widget_settings::upsert_widget_settings(self.db()?, settings).await?;
        self.feed
            .publish(Table::WidgetSettings, ChangeOp::Update, settings);
        Ok(())
    }

    async fn list_advanced_replies(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<ReplyRule>, ChatplugError> {
        rules::list_rules(self.db()?, RuleKind::Advanced, tenant_id).await
    }

    async fn list_auto_replies(&self, tenant_id: &str) -> Result<Vec<ReplyRule>, ChatplugError> {
        rules::list_rules(self.db()?, RuleKind::Basic, tenant_id).await
    }

    async fn insert_advanced_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError> {
        rules::insert_rule(self.db()?, RuleKind::Advanced, rule).await?;
        self.feed.publish(Table::AdvancedReplies, ChangeOp::Insert, rule);
        Ok(())
    }

    async fn insert_auto_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError> {
        rules::insert_rule(self.db()?, RuleKind::Basic, rule).await?;
        self.feed.publish(Table::AutoReplies, ChangeOp::Insert, rule);
        Ok(())
    }

    async fn update_advanced_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError> {
        rules::update_rule(self.db()?, RuleKind::Advanced, rule).await?;
        self.feed.publish(Table::AdvancedReplies, ChangeOp::Update, rule);
        Ok(())
    }

    async fn update_auto_reply(&self, rule: &ReplyRule) -> Result<(), ChatplugError> {
        rules::update_rule(self.db()?, RuleKind::Basic, rule).await?;
        self.feed.publish(Table::AutoReplies, ChangeOp::Update, rule);
        Ok(())
    }

    async fn delete_advanced_reply(
        &self,
        tenant_id: &str,
        id: &str,
    ) -> Result<(), ChatplugError> {
        rules::delete_rule(self.db()?, RuleKind::Advanced, tenant_id, id).await?;
        self.feed.publish(
            Table::AdvancedReplies,
            ChangeOp::Delete,
            &serde_json::json!({"id": id, "tenant_id": tenant_id}),
        );
        Ok(())
    }

    async fn delete_auto_reply(&self, tenant_id: &str, id: &str) -> Result<(), ChatplugError> {
        rules::delete_rule(self.db()?, RuleKind::Basic, tenant_id, id).await?;
        self.feed.publish(
            Table::AutoReplies,
            ChangeOp::Delete,
            &serde_json::json!({"id": id, "tenant_id": tenant_id}),
        );
        Ok(())
    }

    async fn ai_settings(&self, tenant_id: &str) -> Result<Option<AiSettings>, ChatplugError> {
        ai_settings::ai_settings(self.db()?, tenant_id).await
    }

    async fn upsert_ai_settings(&self, settings: &AiSettings) -> Result<(), ChatplugError> {
        ai_settings::upsert_ai_settings(self.db()?, settings).await?;
        self.feed.publish(Table::AiSettings, ChangeOp::Update, settings);
        Ok(())
    }

    async fn find_or_create_session(
        &self,
        tenant_id: &str,
        visitor_id: &str,
    ) -> Result<(Session, bool), ChatplugError> {
        let (session, created) =
            sessions::find_or_create_session(self.db()?, tenant_id, visitor_id).await?;
        if created {
            self.feed.publish(Table::ChatSessions, ChangeOp::Insert, &session);
        }
        Ok((session, created))
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, ChatplugError> {
        sessions::get_session(self.db()?, id).await
    }

    async fn list_sessions(&self, tenant_id: &str) -> Result<Vec<Session>, ChatplugError> {
        sessions::list_sessions(self.db()?, tenant_id).await
    }

    async fn set_session_live(&self, id: &str, live: bool) -> Result<(), ChatplugError> {
        let changed = sessions::set_session_live(self.db()?, id, live).await?;
        if !changed {
            return Err(ChatplugError::SessionNotFound { id: id.to_string() });
        }
        if let Some(session) = sessions::get_session(self.db()?, id).await? {
            self.feed.publish(Table::ChatSessions, ChangeOp::Update, &session);
        }
        Ok(())
    }

    async fn insert_message(&self, msg: &Message) -> Result<Message, ChatplugError> {
        let stored = messages::insert_message(self.db()?, msg).await?;
        self.feed.publish(Table::ChatMessages, ChangeOp::Insert, &stored);
        Ok(stored)
    }

    async fn messages_for_session(
        &self,
        session_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ChatplugError> {
        messages::messages_for_session(self.db()?, session_id, limit).await
    }

    fn subscribe(&self, table: Table) -> ChangeSubscription {
        self.feed.subscribe(table)
    }
}
