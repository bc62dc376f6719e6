// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for AI completion backends.

use async_trait::async_trait;

use crate::error::ChatplugError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, CompletionResponse};

/// Adapter for AI completion providers.
///
/// Credentials and model choice travel with each request because they are
/// tenant-owned configuration, not process configuration. Implementations
/// make a single attempt per call; the reply resolver treats any failure as
/// "AI tier unavailable" and falls through to the static fallback.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the completion text.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ChatplugError>;
}
