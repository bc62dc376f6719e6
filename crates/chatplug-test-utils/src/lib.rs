// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Chatplug integration tests.
//!
//! Provides a mock AI provider with call counting, a delegating storage
//! wrapper with per-tier fetch counters, and a tempfile-backed storage
//! harness with row builders.

pub mod harness;
pub mod instrumented_storage;
pub mod mock_provider;

pub use harness::{make_ai_settings, make_rule, now_ts, visitor_message, TestHarness};
pub use instrumented_storage::InstrumentedStorage;
pub use mock_provider::MockProvider;
