// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant AI fallback configuration.

use chatplug_core::types::AiSettings;
use chatplug_core::ChatplugError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};

fn settings_from_row(row: &Row<'_>) -> rusqlite::Result<AiSettings> {
    Ok(AiSettings {
        tenant_id: row.get(0)?,
        is_enabled: row.get(1)?,
        api_key: row.get(2)?,
        model: row.get(3)?,
        context_info: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Get a tenant's AI settings.
pub async fn ai_settings(
    db: &Database,
    tenant_id: &str,
) -> Result<Option<AiSettings>, ChatplugError> {
    let tenant_id = tenant_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn
                .query_row(
                    "SELECT tenant_id, is_enabled, api_key, model, context_info, created_at
                     FROM ai_settings WHERE tenant_id = ?1",
                    params![tenant_id],
                    settings_from_row,
                )
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace a tenant's AI settings.
///
/// The enabled-requires-key invariant is checked here, at save time; the
/// resolver only ever reads and tolerates whatever is stored.
pub async fn upsert_ai_settings(db: &Database, settings: &AiSettings) -> Result<(), ChatplugError> {
    settings.validate()?;
    let settings = settings.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO ai_settings (tenant_id, is_enabled, api_key, model, context_info, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(tenant_id) DO UPDATE SET
                     is_enabled = excluded.is_enabled,
                     api_key = excluded.api_key,
                     model = excluded.model,
                     context_info = excluded.context_info",
                params![
                    settings.tenant_id,
                    settings.is_enabled,
                    settings.api_key,
                    settings.model,
                    settings.context_info,
                    settings.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn settings(enabled: bool, key: &str) -> AiSettings {
        AiSettings {
            tenant_id: "t1".to_string(),
            is_enabled: enabled,
            api_key: key.to_string(),
            model: "gpt-4".to_string(),
            context_info: "We sell office chairs.".to_string(),
            created_at: "2026-01-01T00:00:00.000000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_and_get() {
        let (db, _dir) = setup_db().await;
        assert!(ai_settings(&db, "t1").await.unwrap().is_none());

        upsert_ai_settings(&db, &settings(true, "sk-live")).await.unwrap();
        let stored = ai_settings(&db, "t1").await.unwrap().unwrap();
        assert!(stored.is_enabled);
        assert_eq!(stored.model, "gpt-4");

        // Second upsert replaces in place.
        upsert_ai_settings(&db, &settings(false, "")).await.unwrap();
        let stored = ai_settings(&db, "t1").await.unwrap().unwrap();
        assert!(!stored.is_enabled);
        assert!(stored.api_key.is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn enabled_without_key_is_rejected_at_save() {
        let (db, _dir) = setup_db().await;
        let err = upsert_ai_settings(&db, &settings(true, "")).await.unwrap_err();
        assert!(matches!(err, ChatplugError::Config(_)));
        assert!(ai_settings(&db, "t1").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
