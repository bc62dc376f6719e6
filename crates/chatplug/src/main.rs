// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatplug - embeddable website chat widget backend.
//!
//! Binary entry point: loads and validates configuration, then dispatches
//! to the selected subcommand.

mod serve;
mod shell;
mod status;

use clap::{Parser, Subcommand};

/// Chatplug - embeddable website chat widget backend.
#[derive(Parser, Debug)]
#[command(name = "chatplug", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the reply-resolution daemon against the change feed.
    Serve,
    /// Chat with the widget backend as a simulated visitor.
    Shell {
        /// Tenant whose rules and settings to chat against.
        #[arg(long, default_value = "local-tenant")]
        tenant: String,
        /// Stable visitor id; a fresh one is generated when omitted.
        #[arg(long)]
        visitor: Option<String>,
    },
    /// Show storage health and row counts.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match chatplug_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            chatplug_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Shell { tenant, visitor } => shell::run_shell(config, tenant, visitor).await,
        Commands::Status => status::run_status(config).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn shell_args_parse() {
        let cli = Cli::parse_from(["chatplug", "shell", "--tenant", "acme", "--visitor", "v-1"]);
        match cli.command {
            Commands::Shell { tenant, visitor } => {
                assert_eq!(tenant, "acme");
                assert_eq!(visitor.as_deref(), Some("v-1"));
            }
            other => panic!("expected shell, got {other:?}"),
        }
    }
}
