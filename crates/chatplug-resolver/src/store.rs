// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant rule-set accessor.
//!
//! Shapes storage data for the resolver and owns the degrade-on-failure
//! policy: a failed fetch means that tier is empty for this pass, never a
//! fatal abort. No caching — every resolution pass reads fresh, so rule
//! edits take effect on the very next visitor message.

use std::sync::Arc;

use chatplug_core::types::{AiSettings, ReplyRule};
use chatplug_core::StorageAdapter;
use tracing::warn;

/// Read-side accessor over the storage adapter.
pub struct RuleStore {
    storage: Arc<dyn StorageAdapter>,
}

impl RuleStore {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// The tenant's advanced rules in evaluation order, or an empty set if
    /// the fetch fails.
    pub async fn advanced_rules(&self, tenant_id: &str) -> Vec<ReplyRule> {
        match self.storage.list_advanced_replies(tenant_id).await {
            Ok(rules) => rules,
            Err(e) => {
                warn!(tenant_id, error = %e, "advanced rule fetch failed, treating tier as empty");
                Vec::new()
            }
        }
    }

    /// The tenant's basic rules in evaluation order, or an empty set if the
    /// fetch fails.
    pub async fn basic_rules(&self, tenant_id: &str) -> Vec<ReplyRule> {
        match self.storage.list_auto_replies(tenant_id).await {
            Ok(rules) => rules,
            Err(e) => {
                warn!(tenant_id, error = %e, "basic rule fetch failed, treating tier as empty");
                Vec::new()
            }
        }
    }

    /// The tenant's AI settings, or `None` if unset or the fetch fails.
    pub async fn ai_settings(&self, tenant_id: &str) -> Option<AiSettings> {
        match self.storage.ai_settings(tenant_id).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(tenant_id, error = %e, "ai settings fetch failed, skipping AI tier");
                None
            }
        }
    }
}
