// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Chatplug widget backend.

use thiserror::Error;

/// The primary error type used across all Chatplug adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ChatplugError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// AI provider errors (API failure, auth rejection, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A rule or AI configuration was rejected at write time.
    #[error("invalid rule: {reason}")]
    InvalidRule { reason: String },

    /// Resolution was requested for a session that does not exist.
    #[error("unknown session `{id}`")]
    SessionNotFound { id: String },

    /// Resolution was requested for a session a human agent has taken over.
    #[error("session `{id}` is in live mode")]
    SessionLive { id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
