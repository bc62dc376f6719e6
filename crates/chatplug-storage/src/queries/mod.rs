// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-table query modules.

pub mod ai_settings;
pub mod messages;
pub mod rules;
pub mod sessions;
pub mod widget_settings;
