// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat message operations.
//!
//! Messages are append-only. Every insert bumps the parent session's
//! `updated_at` in the same transaction and guarantees strictly increasing
//! `created_at` within the session, which transcript consumers rely on.

use std::str::FromStr;

use chatplug_core::types::{Message, SenderType};
use chatplug_core::ChatplugError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let sender: String = row.get(2)?;
    let sender_type = SenderType::from_str(&sender).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Message {
        id: row.get(0)?,
        session_id: row.get(1)?,
        sender_type,
        message: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Append a message, bumping the parent session's `updated_at`.
///
/// If the supplied `created_at` does not exceed the session's latest message
/// timestamp (two appends inside one microsecond, or a caller with a skewed
/// clock), it is nudged one microsecond past the latest so per-session order
/// stays strict. Returns the stored message. Fails with `SessionNotFound`
/// when the parent session does not exist.
pub async fn insert_message(db: &Database, msg: &Message) -> Result<Message, ChatplugError> {
    let mut msg = msg.clone();
    let session_id = msg.session_id.clone();

    let stored = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let session: Option<String> = tx
                .query_row(
                    "SELECT id FROM chat_sessions WHERE id = ?1",
                    params![msg.session_id],
                    |row| row.get(0),
                )
                .optional()?;
            if session.is_none() {
                return Ok(None);
            }

            let latest: Option<String> = tx.query_row(
                "SELECT MAX(created_at) FROM chat_messages WHERE session_id = ?1",
                params![msg.session_id],
                |row| row.get(0),
            )?;
            if let Some(latest) = latest
                && msg.created_at <= latest
            {
                msg.created_at = nudge_past(&latest);
            }

            tx.execute(
                "INSERT INTO chat_messages (id, session_id, sender_type, message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    msg.id,
                    msg.session_id,
                    msg.sender_type.to_string(),
                    msg.message,
                    msg.created_at,
                ],
            )?;
            tx.execute(
                "UPDATE chat_sessions SET updated_at = ?1 WHERE id = ?2",
                params![msg.created_at, msg.session_id],
            )?;
            tx.commit()?;

            Ok(Some(msg))
        })
        .await
        .map_err(map_tr_err)?;

    stored.ok_or(ChatplugError::SessionNotFound { id: session_id })
}

/// Get messages for a session in chronological order.
///
/// With a limit, returns the most recent `limit` messages (still oldest
/// first) — the shape the resolver hands to the AI provider as conversation
/// prefix.
pub async fn messages_for_session(
    db: &Database,
    session_id: &str,
    limit: Option<i64>,
) -> Result<Vec<Message>, ChatplugError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            match limit {
                Some(lim) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, session_id, sender_type, message, created_at
                         FROM chat_messages WHERE session_id = ?1
                         ORDER BY created_at DESC LIMIT ?2",
                    )?;
                    let rows = stmt.query_map(params![session_id, lim], message_from_row)?;
                    for row in rows {
                        messages.push(row?);
                    }
                    messages.reverse();
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, session_id, sender_type, message, created_at
                         FROM chat_messages WHERE session_id = ?1
                         ORDER BY created_at ASC",
                    )?;
                    let rows = stmt.query_map(params![session_id], message_from_row)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// One microsecond past `latest`, preserving the RFC 3339 micros format.
fn nudge_past(latest: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(latest) {
        Ok(dt) => (dt + chrono::Duration::microseconds(1))
            .to_utc()
            .to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        Err(_) => chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::sessions::{find_or_create_session, get_session};
    use tempfile::tempdir;

    async fn setup_db_with_session() -> (Database, String, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let (session, _) = find_or_create_session(&db, "t1", "v1").await.unwrap();
        (db, session.id, dir)
    }

    fn make_msg(id: &str, session_id: &str, text: &str, timestamp: &str) -> Message {
        Message {
            id: id.to_string(),
            session_id: session_id.to_string(),
            sender_type: SenderType::Visitor,
            message: text.to_string(),
            created_at: timestamp.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_get_messages_in_order() {
        let (db, sid, _dir) = setup_db_with_session().await;

        for (id, text, ts) in [
            ("m1", "hello", "2026-01-01T00:00:01.000000Z"),
            ("m2", "is anyone there?", "2026-01-01T00:00:02.000000Z"),
            ("m3", "hello?", "2026-01-01T00:00:03.000000Z"),
        ] {
            insert_message(&db, &make_msg(id, &sid, text, ts)).await.unwrap();
        }

        let messages = messages_for_session(&db, &sid, None).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[1].id, "m2");
        assert_eq!(messages[2].id, "m3");
        assert!(messages[0].created_at < messages[1].created_at);
        assert!(messages[1].created_at < messages[2].created_at);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_timestamps_are_nudged_forward() {
        let (db, sid, _dir) = setup_db_with_session().await;
        let ts = "2026-01-01T00:00:01.000000Z";

        let first = insert_message(&db, &make_msg("m1", &sid, "one", ts)).await.unwrap();
        let second = insert_message(&db, &make_msg("m2", &sid, "two", ts)).await.unwrap();
        // Even a timestamp in the past must land after the latest message.
        let third = insert_message(
            &db,
            &make_msg("m3", &sid, "three", "2025-12-31T23:59:59.000000Z"),
        )
        .await
        .unwrap();

        assert_eq!(first.created_at, ts);
        assert!(second.created_at > first.created_at);
        assert!(third.created_at > second.created_at);

        let messages = messages_for_session(&db, &sid, None).await.unwrap();
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn insert_bumps_session_updated_at() {
        let (db, sid, _dir) = setup_db_with_session().await;
        let before = get_session(&db, &sid).await.unwrap().unwrap();

        let ts = "2027-06-01T12:00:00.000000Z";
        insert_message(&db, &make_msg("m1", &sid, "ping", ts)).await.unwrap();

        let after = get_session(&db, &sid).await.unwrap().unwrap();
        assert_eq!(after.updated_at, ts);
        assert!(after.updated_at > before.updated_at);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn insert_into_missing_session_fails() {
        let (db, _sid, _dir) = setup_db_with_session().await;
        let err = insert_message(
            &db,
            &make_msg("m1", "ghost-session", "hi", "2026-01-01T00:00:01.000000Z"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ChatplugError::SessionNotFound { .. }));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn limit_returns_most_recent_in_chronological_order() {
        let (db, sid, _dir) = setup_db_with_session().await;
        for i in 0..5 {
            let msg = make_msg(
                &format!("m{i}"),
                &sid,
                &format!("msg {i}"),
                &format!("2026-01-01T00:00:0{i}.000000Z"),
            );
            insert_message(&db, &msg).await.unwrap();
        }

        let messages = messages_for_session(&db, &sid, Some(3)).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].id, "m2");
        assert_eq!(messages[1].id, "m3");
        assert_eq!(messages[2].id, "m4");

        db.close().await.unwrap();
    }
}
