// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./chatplug.toml` > `~/.config/chatplug/chatplug.toml`
//! > `/etc/chatplug/chatplug.toml`, with environment variable overrides via
//! the `CHATPLUG_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ChatplugConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chatplug/chatplug.toml` (system-wide)
/// 3. `~/.config/chatplug/chatplug.toml` (user XDG config)
/// 4. `./chatplug.toml` (local directory)
/// 5. `CHATPLUG_*` environment variables
pub fn load_config() -> Result<ChatplugConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatplugConfig::default()))
        .merge(Toml::file("/etc/chatplug/chatplug.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("chatplug/chatplug.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("chatplug.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and for callers that supply config content directly.
pub fn load_config_from_str(toml_content: &str) -> Result<ChatplugConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatplugConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChatplugConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatplugConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `CHATPLUG_STORAGE_DATABASE_PATH` must map
/// to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("CHATPLUG_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: CHATPLUG_RESOLVER_FALLBACK_REPLY -> "resolver_fallback_reply"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("ai_", "ai.", 1)
            .replacen("resolver_", "resolver.", 1)
            .replacen("widget_", "widget.", 1);
        mapped.into()
    })
}
