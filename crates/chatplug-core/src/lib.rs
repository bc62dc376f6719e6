// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Chatplug widget backend.
//!
//! This crate provides the foundational trait definitions, error type, and
//! domain types used throughout the Chatplug workspace. The storage and AI
//! provider adapters implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ChatplugError;
pub use types::{
    AiSettings, ChangeEvent, ChangeOp, ChangeSubscription, CompletionRequest,
    CompletionResponse, MatchingType, Message, ReplyRule, SenderType, Session, Table,
    TranscriptEntry, WidgetSettings,
};

// Re-export adapter traits at crate root.
pub use traits::{PluginAdapter, ProviderAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _config = ChatplugError::Config("test".into());
        let _storage = ChatplugError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _provider = ChatplugError::Provider {
            message: "test".into(),
            source: None,
        };
        let _rule = ChatplugError::InvalidRule {
            reason: "test".into(),
        };
        let _not_found = ChatplugError::SessionNotFound { id: "s1".into() };
        let _live = ChatplugError::SessionLive { id: "s1".into() };
        let _timeout = ChatplugError::Timeout {
            duration: std::time::Duration::from_secs(20),
        };
        let _internal = ChatplugError::Internal("test".into());
    }

    #[test]
    fn contract_errors_render_session_id() {
        let err = ChatplugError::SessionLive { id: "sess-9".into() };
        assert!(err.to_string().contains("sess-9"));
    }

    #[test]
    fn table_names_match_schema() {
        assert_eq!(Table::WidgetSettings.to_string(), "widget_settings");
        assert_eq!(Table::AutoReplies.to_string(), "auto_replies");
        assert_eq!(Table::AdvancedReplies.to_string(), "advanced_replies");
        assert_eq!(Table::AiSettings.to_string(), "ai_settings");
        assert_eq!(Table::ChatSessions.to_string(), "chat_sessions");
        assert_eq!(Table::ChatMessages.to_string(), "chat_messages");
    }

    #[test]
    fn trait_objects_are_usable() {
        // Compile-time check that the adapter traits are object safe.
        fn _assert_storage(_: &dyn StorageAdapter) {}
        fn _assert_provider(_: &dyn ProviderAdapter) {}
    }
}
