// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery trait.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::WebhookResponse;

/// Performs the outbound call to the external delivery endpoint.
#[async_trait]
pub trait WebhookAdapter: PluginAdapter {
    /// Deliver `content` to `phone_number` and normalize the endpoint's answer.
    ///
    /// A non-2xx response is `Ok` with `success == false`. `Err` is reserved for
    /// configuration problems and transport failures where no response exists.
    async fn send(&self, phone_number: &str, content: &str)
    -> Result<WebhookResponse, CourierError>;
}
