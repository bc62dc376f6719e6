// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session/message ledger.
//!
//! Owns session lifecycle (creation with welcome seeding, live-mode toggle,
//! closing) and the append-only message log. The storage layer guarantees
//! that every append bumps the parent session's `updated_at` and that
//! per-session `created_at` stays strictly increasing.

use std::sync::Arc;

use chatplug_core::types::{Message, SenderType, Session};
use chatplug_core::{ChatplugError, StorageAdapter};
use tracing::{info, warn};

/// Ledger over the storage adapter.
pub struct SessionLedger {
    storage: Arc<dyn StorageAdapter>,
    default_welcome: String,
}

impl SessionLedger {
    /// `default_welcome` seeds new sessions for tenants without stored
    /// widget settings.
    pub fn new(storage: Arc<dyn StorageAdapter>, default_welcome: String) -> Self {
        Self {
            storage,
            default_welcome,
        }
    }

    /// Reuse the visitor's most recent session or create one.
    ///
    /// Idempotent: two calls for the same tenant+visitor return the same
    /// session. A newly created session is seeded with the tenant's welcome
    /// message as its first `business_user` message; reuse never re-seeds.
    pub async fn ensure_session(
        &self,
        tenant_id: &str,
        visitor_id: &str,
    ) -> Result<Session, ChatplugError> {
        let (session, created) = self
            .storage
            .find_or_create_session(tenant_id, visitor_id)
            .await?;

        if created {
            let welcome = self.welcome_message(tenant_id).await;
            self.append_message(&session.id, SenderType::BusinessUser, &welcome)
                .await?;
            info!(
                session_id = session.id.as_str(),
                tenant_id, visitor_id, "session created"
            );
        }

        Ok(session)
    }

    async fn welcome_message(&self, tenant_id: &str) -> String {
        match self.storage.widget_settings(tenant_id).await {
            Ok(Some(settings)) if !settings.welcome_message.trim().is_empty() => {
                settings.welcome_message
            }
            Ok(_) => self.default_welcome.clone(),
            Err(e) => {
                warn!(tenant_id, error = %e, "widget settings fetch failed, using default welcome");
                self.default_welcome.clone()
            }
        }
    }

    /// Append one message to a session's log.
    pub async fn append_message(
        &self,
        session_id: &str,
        sender_type: SenderType,
        text: &str,
    ) -> Result<Message, ChatplugError> {
        let msg = Message {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            sender_type,
            message: text.to_string(),
            created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        };
        self.storage.insert_message(&msg).await
    }

    /// Toggle live mode (human agent takeover).
    pub async fn set_live(&self, session_id: &str, live: bool) -> Result<(), ChatplugError> {
        self.storage.set_session_live(session_id, live).await?;
        info!(session_id, live, "live mode changed");
        Ok(())
    }

    /// End live mode; the session returns to automated handling.
    pub async fn close_session(&self, session_id: &str) -> Result<(), ChatplugError> {
        self.storage.set_session_live(session_id, false).await?;
        info!(session_id, "session closed");
        Ok(())
    }

    /// Session transcript, oldest first.
    pub async fn transcript(
        &self,
        session_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ChatplugError> {
        self.storage.messages_for_session(session_id, limit).await
    }

    /// Point lookup.
    pub async fn session(&self, session_id: &str) -> Result<Option<Session>, ChatplugError> {
        self.storage.get_session(session_id).await
    }
}
