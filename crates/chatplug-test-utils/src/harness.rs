// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tempfile-backed storage harness and row builders for integration tests.

use std::sync::Arc;

use chatplug_config::model::StorageConfig;
use chatplug_core::types::{AiSettings, MatchingType, Message, ReplyRule, SenderType};
use chatplug_core::StorageAdapter;
use chatplug_storage::SqliteStorage;
use tempfile::TempDir;

/// An initialized SQLite storage over a temporary directory.
///
/// The directory lives as long as the harness; dropping it removes the
/// database.
pub struct TestHarness {
    storage: Arc<SqliteStorage>,
    _dir: TempDir,
}

impl TestHarness {
    /// Open a fresh storage with migrations applied.
    pub async fn open() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = StorageConfig {
            database_path: dir
                .path()
                .join("harness.db")
                .to_string_lossy()
                .into_owned(),
            wal_mode: true,
        };
        let storage = Arc::new(SqliteStorage::new(config));
        storage.initialize().await.expect("storage init");
        Self {
            storage,
            _dir: dir,
        }
    }

    pub fn storage(&self) -> Arc<SqliteStorage> {
        Arc::clone(&self.storage)
    }
}

/// Current timestamp in the storage layer's format.
pub fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Build a reply rule with a fresh id.
pub fn make_rule(
    tenant_id: &str,
    keywords: &[&str],
    matching_type: MatchingType,
    response: &str,
) -> ReplyRule {
    ReplyRule {
        id: uuid::Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        matching_type,
        response: response.to_string(),
        is_url: false,
        created_at: now_ts(),
    }
}

/// Build enabled AI settings for a tenant.
pub fn make_ai_settings(tenant_id: &str, context_info: &str) -> AiSettings {
    AiSettings {
        tenant_id: tenant_id.to_string(),
        is_enabled: true,
        api_key: "sk-test".to_string(),
        model: "gpt-4".to_string(),
        context_info: context_info.to_string(),
        created_at: now_ts(),
    }
}

/// Build a visitor message row for a session.
pub fn visitor_message(session_id: &str, text: &str) -> Message {
    Message {
        id: uuid::Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        sender_type: SenderType::Visitor,
        message: text.to_string(),
        created_at: now_ts(),
    }
}
