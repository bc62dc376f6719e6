// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Widget agent: ties the ledger and resolver together and enforces the
//! concurrency model.
//!
//! Resolution passes for different sessions run concurrently; within one
//! session they are serialized through a per-session async mutex, so reply
//! N lands before pass N+1 starts. The live-mode check happens inside the
//! resolver after the lock is acquired — once a human takes over, no new
//! pass starts, while an in-flight pass completes and appends its reply.

pub mod ledger;

use std::collections::HashMap;
use std::sync::Arc;

use chatplug_core::types::{ChangeEvent, ChangeOp, Message, SenderType, Session, Table};
use chatplug_core::{ChatplugError, StorageAdapter};
use chatplug_resolver::{Reply, ReplyResolver};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

pub use ledger::SessionLedger;

/// Coordinates visitor messages, the ledger, and the reply resolver.
pub struct WidgetAgent {
    storage: Arc<dyn StorageAdapter>,
    ledger: Arc<SessionLedger>,
    resolver: Arc<ReplyResolver>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl WidgetAgent {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        ledger: Arc<SessionLedger>,
        resolver: Arc<ReplyResolver>,
    ) -> Self {
        Self {
            storage,
            ledger,
            resolver,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn ledger(&self) -> Arc<SessionLedger> {
        Arc::clone(&self.ledger)
    }

    /// Embedded entry point (shell, tests): ensure the visitor's session,
    /// append the message, and run one resolution pass inline.
    ///
    /// Returns the session and the automated reply, or `None` when the
    /// session is in live mode and the message was left for the human
    /// agent. Do not combine with [`run`]: the daemon loop already resolves
    /// every visitor message it sees on the change feed.
    ///
    /// [`run`]: WidgetAgent::run
    pub async fn submit(
        &self,
        tenant_id: &str,
        visitor_id: &str,
        text: &str,
    ) -> Result<(Session, Option<Reply>), ChatplugError> {
        let session = self.ledger.ensure_session(tenant_id, visitor_id).await?;
        self.ledger
            .append_message(&session.id, SenderType::Visitor, text)
            .await?;
        let reply = self.run_resolution(tenant_id, &session.id, text).await;
        Ok((session, reply))
    }

    /// Daemon entry point: resolve every visitor message arriving on the
    /// storage change feed until cancelled. In-flight passes are drained
    /// before returning.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), ChatplugError> {
        let mut sub = self.storage.subscribe(Table::ChatMessages);
        let tracker = TaskTracker::new();
        info!("widget agent running");

        loop {
            tokio::select! {
                event = sub.next() => {
                    match event {
                        Some(event) if event.op == ChangeOp::Insert => {
                            let agent = Arc::clone(&self);
                            tracker.spawn(async move {
                                if let Err(e) = agent.handle_event(event).await {
                                    error!(error = %e, "failed to handle message event");
                                }
                            });
                        }
                        Some(_) => {}
                        None => {
                            info!("change feed closed, stopping widget agent");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping widget agent");
                    break;
                }
            }
        }

        tracker.close();
        tracker.wait().await;
        info!("widget agent stopped");
        Ok(())
    }

    /// React to one inserted message row: visitor messages trigger a
    /// resolution pass, everything else is transcript traffic.
    async fn handle_event(&self, event: ChangeEvent) -> Result<(), ChatplugError> {
        let msg: Message = match serde_json::from_value(event.row) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "ignoring malformed change event payload");
                return Ok(());
            }
        };
        if msg.sender_type != SenderType::Visitor {
            return Ok(());
        }

        let session = self
            .storage
            .get_session(&msg.session_id)
            .await?
            .ok_or(ChatplugError::SessionNotFound {
                id: msg.session_id.clone(),
            })?;

        self.run_resolution(&session.tenant_id, &session.id, &msg.message)
            .await;
        Ok(())
    }

    /// One serialized resolution pass. Returns `None` when the session is
    /// live or the pass failed; the visitor's message stays in the ledger
    /// either way.
    async fn run_resolution(
        &self,
        tenant_id: &str,
        session_id: &str,
        text: &str,
    ) -> Option<Reply> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        match self.resolver.resolve(tenant_id, session_id, text).await {
            Ok(reply) => Some(reply),
            Err(ChatplugError::SessionLive { .. }) => {
                debug!(session_id, "live mode, automated reply suppressed");
                None
            }
            Err(e) => {
                error!(session_id, error = %e, "resolution pass failed");
                None
            }
        }
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}
