// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Chatplug widget backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Chatplug configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatplugConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// AI completion provider settings (endpoint and request shaping; the
    /// API key and model are per-tenant data, not process configuration).
    #[serde(default)]
    pub ai: AiProviderConfig,

    /// Reply resolution settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Widget defaults applied when a tenant has no stored settings.
    #[serde(default)]
    pub widget: WidgetConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "chatplug".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("chatplug").join("chatplug.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("chatplug.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// AI completion provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AiProviderConfig {
    /// Chat-completions endpoint URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Upper bound on a single completion request. Exceeding it is treated
    /// as provider failure and routes to the static fallback.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum tokens to generate per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AiProviderConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_max_tokens() -> u32 {
    512
}

/// Reply resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Acknowledgement sent when no rule matches and the AI tier is
    /// unavailable. The visitor never sees an error state; this is the
    /// worst-case reply.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,

    /// Number of recent transcript messages handed to the AI provider as
    /// conversation prefix.
    #[serde(default = "default_transcript_limit")]
    pub transcript_limit: i64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fallback_reply: default_fallback_reply(),
            transcript_limit: default_transcript_limit(),
        }
    }
}

fn default_fallback_reply() -> String {
    "Thanks for your message! We'll get back to you soon.".to_string()
}

fn default_transcript_limit() -> i64 {
    20
}

/// Widget defaults for tenants without stored settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetConfig {
    /// Welcome message seeded as the first business message of a new
    /// session when the tenant has no `widget_settings` row.
    #[serde(default = "default_welcome_message")]
    pub default_welcome_message: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            default_welcome_message: default_welcome_message(),
        }
    }
}

fn default_welcome_message() -> String {
    "Hello! How can I help you today?".to_string()
}
