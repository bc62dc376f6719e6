// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread; do not create additional `Connection` instances for writes. That
//! single writer is what lets multi-statement operations (find-or-create,
//! append-and-bump) execute as one logical operation.

use std::path::Path;
use std::time::Duration;

use chatplug_core::ChatplugError;
use tokio_rusqlite::Connection;

/// An open SQLite database with migrations applied.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL mode enabled.
    pub async fn open(path: &str) -> Result<Self, ChatplugError> {
        Self::open_with_options(path, true).await
    }

    /// Open (or create) the database at `path`.
    ///
    /// Creates parent directories as needed, applies PRAGMAs
    /// (`journal_mode`, `foreign_keys`, busy timeout), and runs embedded
    /// migrations before returning.
    pub async fn open_with_options(path: &str, wal_mode: bool) -> Result<Self, ChatplugError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ChatplugError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path.to_owned())
            .await
            .map_err(|e| map_tr_err(e.into()))?;

        conn.call(move |conn| {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(Duration::from_secs(5))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(move |conn| crate::migrations::run_migrations(conn))
            .await
            .map_err(|e| ChatplugError::Storage {
                source: Box::new(e),
            })?;

        Ok(Self { conn })
    }

    /// The underlying serialized connection handle.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the background connection thread, flushing pending work.
    pub async fn close(&self) -> Result<(), ChatplugError> {
        self.conn.clone().close().await.map_err(map_tr_err)
    }
}

/// Convert a tokio-rusqlite error into the crate-wide storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> ChatplugError {
    ChatplugError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema_and_reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/test.db");
        let path = path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();
        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> rusqlite::Result<Vec<String>> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .await
            .unwrap();

        for table in [
            "widget_settings",
            "auto_replies",
            "advanced_replies",
            "ai_settings",
            "chat_sessions",
            "chat_messages",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }
        db.close().await.unwrap();

        // Reopening runs migrations again as a no-op.
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }
}
