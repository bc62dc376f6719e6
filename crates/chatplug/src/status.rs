// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatplug status` command implementation.

use chatplug_config::ChatplugConfig;
use chatplug_core::types::HealthStatus;
use chatplug_core::{ChatplugError, PluginAdapter, StorageAdapter};
use chatplug_openai::OpenAiProvider;
use chatplug_storage::SqliteStorage;
use colored::Colorize;

fn render_health(name: &str, health: &HealthStatus) {
    match health {
        HealthStatus::Healthy => println!("{name}: {}", "healthy".green()),
        HealthStatus::Degraded(reason) => {
            println!("{name}: {} ({reason})", "degraded".yellow());
        }
        HealthStatus::Unhealthy(reason) => {
            println!("{name}: {} ({reason})", "unhealthy".red());
        }
    }
}

/// Runs the `chatplug status` command.
pub async fn run_status(config: ChatplugConfig) -> Result<(), ChatplugError> {
    println!("{}", "chatplug status".bold());
    println!("database: {}", config.storage.database_path.dimmed());

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    render_health("storage", &storage.health_check().await?);

    let stats = storage.stats().await?;
    println!("  sessions:         {}", stats.sessions);
    println!("  messages:         {}", stats.messages);
    println!("  basic rules:      {}", stats.auto_replies);
    println!("  advanced rules:   {}", stats.advanced_replies);

    let provider = OpenAiProvider::new(&config.ai)?;
    render_health("provider", &provider.health_check().await?);
    println!("  endpoint:         {}", config.ai.api_base_url.dimmed());

    storage.close().await?;
    Ok(())
}
