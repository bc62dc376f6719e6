// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Chatplug widget backend.
//!
//! Implements the `StorageAdapter` trait from `chatplug-core` over a single
//! tokio-rusqlite connection with embedded refinery migrations, and fans out
//! row-change events through a broadcast change feed.

pub mod adapter;
pub mod database;
pub mod events;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::{SqliteStorage, StorageStats};
pub use database::Database;
pub use events::ChangeFeed;
