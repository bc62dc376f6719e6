// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat session operations.

use chatplug_core::types::Session;
use chatplug_core::ChatplugError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        visitor_id: row.get(2)?,
        is_active: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

const SESSION_COLUMNS: &str = "id, tenant_id, visitor_id, is_active, created_at, updated_at";

/// Return the most recent session for the tenant+visitor pair, creating one
/// when none exists.
///
/// Lookup and insert run inside a single transaction on the serialized
/// writer thread, so two tabs racing on the same visitor observe at most one
/// new session. The boolean is true when a session was created.
pub async fn find_or_create_session(
    db: &Database,
    tenant_id: &str,
    visitor_id: &str,
) -> Result<(Session, bool), ChatplugError> {
    let tenant_id = tenant_id.to_string();
    let visitor_id = visitor_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let existing = tx
                .query_row(
                    &format!(
                        "SELECT {SESSION_COLUMNS} FROM chat_sessions
                         WHERE tenant_id = ?1 AND visitor_id = ?2
                         ORDER BY created_at DESC LIMIT 1"
                    ),
                    params![tenant_id, visitor_id],
                    session_from_row,
                )
                .optional()?;

            if let Some(session) = existing {
                tx.commit()?;
                return Ok((session, false));
            }

            let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
            let session = Session {
                id: uuid::Uuid::new_v4().to_string(),
                tenant_id,
                visitor_id,
                is_active: false,
                created_at: now.clone(),
                updated_at: now,
            };

            tx.execute(
                "INSERT INTO chat_sessions (id, tenant_id, visitor_id, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    session.id,
                    session.tenant_id,
                    session.visitor_id,
                    session.is_active,
                    session.created_at,
                    session.updated_at,
                ],
            )?;
            tx.commit()?;

            Ok((session, true))
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by ID.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<Session>, ChatplugError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn
                .query_row(
                    &format!("SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE id = ?1"),
                    params![id],
                    session_from_row,
                )
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(map_tr_err)
}

/// List a tenant's sessions, most recently active first.
pub async fn list_sessions(db: &Database, tenant_id: &str) -> Result<Vec<Session>, ChatplugError> {
    let tenant_id = tenant_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM chat_sessions
                 WHERE tenant_id = ?1 ORDER BY updated_at DESC"
            ))?;
            let rows = stmt.query_map(params![tenant_id], session_from_row)?;
            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row?);
            }
            Ok(sessions)
        })
        .await
        .map_err(map_tr_err)
}

/// Set or clear the live-mode flag, bumping `updated_at`.
///
/// Returns false when no session with the given id exists.
pub async fn set_session_live(
    db: &Database,
    id: &str,
    live: bool,
) -> Result<bool, ChatplugError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
            let changed = conn.execute(
                "UPDATE chat_sessions SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
                params![live, now, id],
            )?;
            Ok(changed > 0)
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

    #[tokio::test]
    async fn find_or_create_then_reuse() {
        let (db, _dir) = setup_db().await;

        let (created, was_created) = find_or_create_session(&db, "t1", "v1").await.unwrap();
        assert!(was_created);
        assert!(!created.is_active, "new sessions start out of live mode");

        let (reused, was_created) = find_or_create_session(&db, "t1", "v1").await.unwrap();
        assert!(!was_created);
        assert_eq!(reused.id, created.id);

        // A different visitor gets a different session.
        let (other, was_created) = find_or_create_session(&db, "t1", "v2").await.unwrap();
        assert!(was_created);
        assert_ne!(other.id, created.id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_session_returns_none() {
        let (db, _dir) = setup_db().await;
        let result = get_session(&db, "no-such-session").await.unwrap();
        assert!(result.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn live_flag_roundtrip() {
        let (db, _dir) = setup_db().await;
        let (session, _) = find_or_create_session(&db, "t1", "v1").await.unwrap();

        assert!(set_session_live(&db, &session.id, true).await.unwrap());
        let live = get_session(&db, &session.id).await.unwrap().unwrap();
        assert!(live.is_active);
        assert!(live.updated_at >= session.updated_at);

        assert!(set_session_live(&db, &session.id, false).await.unwrap());
        let closed = get_session(&db, &session.id).await.unwrap().unwrap();
        assert!(!closed.is_active);

        assert!(!set_session_live(&db, "missing", true).await.unwrap());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_sessions_orders_by_activity() {
        let (db, _dir) = setup_db().await;
        let (first, _) = find_or_create_session(&db, "t1", "v1").await.unwrap();
        let (second, _) = find_or_create_session(&db, "t1", "v2").await.unwrap();
        // Touch the first session so it becomes the most recently active.
        set_session_live(&db, &first.id, false).await.unwrap();

        let sessions = list_sessions(&db, "t1").await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, first.id);
        assert_eq!(sessions[1].id, second.id);

        assert!(list_sessions(&db, "other-tenant").await.unwrap().is_empty());
        db.close().await.unwrap();
    }
}
