// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-change broadcast standing in for the hosted backend's push
//! subscription.
//!
//! The adapter publishes an event after every successful write; subscribers
//! receive the full row as JSON. Events are best-effort: a feed with no
//! subscribers drops them, and a lagging subscriber skips what it missed.
//! Consumers that need exact state re-fetch on demand.

use chatplug_core::types::{ChangeEvent, ChangeOp, ChangeSubscription, Table};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;

const FEED_CAPACITY: usize = 256;

/// Broadcast fan-out of row-change events.
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Subscribe to changes on one table.
    pub fn subscribe(&self, table: Table) -> ChangeSubscription {
        ChangeSubscription::new(self.tx.subscribe(), table)
    }

    /// Publish a row change. Serialization failures are logged and dropped;
    /// the write itself has already succeeded.
    pub fn publish<T: Serialize>(&self, table: Table, op: ChangeOp, row: &T) {
        match serde_json::to_value(row) {
            Ok(value) => {
                // Send errors only mean there are no subscribers right now.
                let _ = self.tx.send(ChangeEvent {
                    table,
                    op,
                    row: value,
                });
            }
            Err(e) => {
                warn!(error = %e, table = %table, "failed to serialize change event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatplug_core::types::{Message, SenderType};

    #[tokio::test]
    async fn publish_reaches_table_subscribers() {
        let feed = ChangeFeed::new();
        let mut messages = feed.subscribe(Table::ChatMessages);
        let mut sessions = feed.subscribe(Table::ChatSessions);

        let msg = Message {
            id: "m1".into(),
            session_id: "s1".into(),
            sender_type: SenderType::Visitor,
            message: "hello".into(),
            created_at: "2026-01-01T00:00:01.000000Z".into(),
        };
        feed.publish(Table::ChatMessages, ChangeOp::Insert, &msg);

        let event = messages.next().await.expect("message subscriber gets event");
        assert_eq!(event.op, ChangeOp::Insert);
        assert_eq!(event.row["sender_type"], "visitor");
        assert_eq!(event.row["session_id"], "s1");

        // The sessions subscriber never sees message events; closing the
        // feed ends the subscription.
        drop(feed);
        assert!(sessions.next().await.is_none());
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let feed = ChangeFeed::new();
        feed.publish(Table::AutoReplies, ChangeOp::Delete, &serde_json::json!({"id": "r1"}));
    }
}
