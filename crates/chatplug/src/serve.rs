// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatplug serve` command implementation.
//!
//! Wires the SQLite storage, the OpenAI provider, the ledger, and the reply
//! resolver into a [`WidgetAgent`] and runs its change-feed loop until
//! ctrl-c. In-flight resolution passes finish before shutdown.

use std::sync::Arc;

use chatplug_agent::{SessionLedger, WidgetAgent};
use chatplug_config::ChatplugConfig;
use chatplug_core::{ChatplugError, StorageAdapter};
use chatplug_openai::OpenAiProvider;
use chatplug_resolver::{ReplyResolver, ResolverOptions};
use chatplug_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Initialize the tracing subscriber; `RUST_LOG` overrides the configured
/// level.
pub(crate) fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Build the full agent stack over an initialized storage.
pub(crate) fn build_agent(
    config: &ChatplugConfig,
    storage: Arc<dyn StorageAdapter>,
) -> Result<Arc<WidgetAgent>, ChatplugError> {
    let provider = Arc::new(OpenAiProvider::new(&config.ai)?);
    let ledger = Arc::new(SessionLedger::new(
        Arc::clone(&storage),
        config.widget.default_welcome_message.clone(),
    ));
    let resolver = Arc::new(ReplyResolver::new(
        Arc::clone(&storage),
        provider,
        ResolverOptions::from_config(&config.resolver, &config.ai),
    ));
    Ok(Arc::new(WidgetAgent::new(storage, ledger, resolver)))
}

/// Runs the `chatplug serve` command.
pub async fn run_serve(config: ChatplugConfig) -> Result<(), ChatplugError> {
    init_tracing(&config.service.log_level);
    info!(service = config.service.name.as_str(), "starting chatplug serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(
        path = config.storage.database_path.as_str(),
        "storage initialized"
    );

    let agent = build_agent(&config, Arc::clone(&storage) as Arc<dyn StorageAdapter>)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("ctrl-c received, shutting down");
                cancel.cancel();
            }
        });
    }

    agent.run(cancel).await?;

    storage.close().await?;
    info!("chatplug serve stopped");
    Ok(())
}
