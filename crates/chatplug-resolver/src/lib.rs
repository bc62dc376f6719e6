// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply-resolution engine for the Chatplug widget backend.
//!
//! Given an incoming visitor message, decides which response channel
//! answers — advanced keyword rules, basic keyword rules, AI completion, or
//! the static fallback — and appends exactly one reply to the session.

pub mod matcher;
pub mod resolver;
pub mod store;

pub use matcher::matches;
pub use resolver::{Reply, ReplyChannel, ReplyResolver, ResolverOptions};
pub use store::RuleStore;
