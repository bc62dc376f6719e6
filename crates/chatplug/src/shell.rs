// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatplug shell` command implementation.
//!
//! A visitor simulator: each run behaves like one browser with the embed
//! snippet installed, using a stable visitor id for the lifetime of the
//! process (pass `--visitor` to keep the same conversation across runs).
//! Useful for trying out rules and AI settings without a website.

use std::sync::Arc;

use chatplug_config::ChatplugConfig;
use chatplug_core::{ChatplugError, StorageAdapter};
use chatplug_resolver::ReplyChannel;
use chatplug_storage::SqliteStorage;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

fn reply_tag(channel: ReplyChannel) -> colored::ColoredString {
    match channel {
        ReplyChannel::Advanced => "[advanced]".magenta(),
        ReplyChannel::Basic => "[auto]".yellow(),
        ReplyChannel::Ai => "[ai]".cyan(),
        ReplyChannel::Fallback => "[fallback]".dimmed(),
    }
}

fn print_help() {
    println!("  /live        hand the session to a (pretend) human agent");
    println!("  /close       close the session, automation resumes");
    println!("  /transcript  print the session transcript");
    println!("  /quit        leave the shell");
}

/// Runs the `chatplug shell` command.
pub async fn run_shell(
    config: ChatplugConfig,
    tenant: String,
    visitor: Option<String>,
) -> Result<(), ChatplugError> {
    // Keep the REPL quiet unless RUST_LOG says otherwise.
    crate::serve::init_tracing("warn");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let agent = crate::serve::build_agent(&config, Arc::clone(&storage) as Arc<dyn StorageAdapter>)?;

    let visitor_id = visitor.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let session = agent.ledger().ensure_session(&tenant, &visitor_id).await?;

    println!(
        "{} tenant {} / visitor {}",
        "chatplug shell".bold(),
        tenant.green(),
        visitor_id.dimmed()
    );
    println!("type a message, or /help for commands\n");
    for msg in agent.ledger().transcript(&session.id, None).await? {
        println!("  {} {}", format!("[{}]", msg.sender_type).dimmed(), msg.message);
    }

    let mut rl = DefaultEditor::new()
        .map_err(|e| ChatplugError::Internal(format!("readline init failed: {e}")))?;

    loop {
        match rl.readline("visitor> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match line {
                    "/quit" | "/exit" => break,
                    "/help" => {
                        print_help();
                        continue;
                    }
                    "/live" => {
                        agent.ledger().set_live(&session.id, true).await?;
                        println!("{}", "session handed to a human agent".yellow());
                        continue;
                    }
                    "/close" => {
                        agent.ledger().close_session(&session.id).await?;
                        println!("{}", "session closed, automation resumes".green());
                        continue;
                    }
                    "/transcript" => {
                        for msg in agent.ledger().transcript(&session.id, None).await? {
                            println!(
                                "  {} {} {}",
                                msg.created_at.dimmed(),
                                format!("[{}]", msg.sender_type).dimmed(),
                                msg.message
                            );
                        }
                        continue;
                    }
                    _ => {}
                }

                match agent.submit(&tenant, &visitor_id, line).await {
                    Ok((_, Some(reply))) => {
                        println!("{} {}", reply_tag(reply.channel), reply.text);
                    }
                    Ok((_, None)) => {
                        println!("{}", "(live mode: a human agent will reply)".dimmed());
                    }
                    Err(e) => {
                        eprintln!("{} {e}", "error:".red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} {e}", "readline error:".red());
                break;
            }
        }
    }

    storage.close().await?;
    println!("bye");
    Ok(())
}
