// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock webhook adapter for deterministic pipeline tests.
//!
//! Replies are popped from a FIFO queue. When the queue is empty, a 202
//! acceptance without identifier is returned.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use courier_core::{
    AdapterType, CourierError, HealthStatus, PluginAdapter, WebhookAdapter, WebhookResponse,
};

/// One recorded call to [`MockWebhook::send`].
#[derive(Debug, Clone)]
pub struct WebhookCall {
    pub phone_number: String,
    pub content: String,
    /// When the call started, on the tokio clock (pausable in tests).
    pub at: Instant,
}

pub struct MockWebhook {
    replies: Mutex<VecDeque<Result<WebhookResponse, CourierError>>>,
    calls: Mutex<Vec<WebhookCall>>,
    latency: Duration,
}

impl MockWebhook {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// Simulate endpoint latency on every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue a reply for the next unanswered call.
    pub async fn push_reply(&self, reply: Result<WebhookResponse, CourierError>) {
        self.replies.lock().await.push_back(reply);
    }

    /// Queue a 2xx reply carrying `messageId`.
    pub async fn push_accepted(&self, status: u16, message_id: Option<&str>) {
        self.push_reply(Ok(Self::accepted(status, message_id))).await;
    }

    /// Queue a non-2xx reply with an empty body.
    pub async fn push_rejected(&self, status: u16) {
        self.push_reply(Ok(WebhookResponse {
            success: false,
            external_message_id: None,
            body: serde_json::json!({}),
            http_status: status,
        }))
        .await;
    }

    pub async fn push_error(&self, error: CourierError) {
        self.push_reply(Err(error)).await;
    }

    pub async fn calls(&self) -> Vec<WebhookCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    fn accepted(status: u16, message_id: Option<&str>) -> WebhookResponse {
        let body = match message_id {
            Some(id) => serde_json::json!({ "message": "Accepted", "messageId": id }),
            None => serde_json::json!({ "message": "Accepted" }),
        };
        WebhookResponse {
            success: true,
            external_message_id: message_id.map(str::to_string),
            body,
            http_status: status,
        }
    }
}

impl Default for MockWebhook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockWebhook {
    fn name(&self) -> &str {
        "mock-webhook"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Webhook
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl WebhookAdapter for MockWebhook {
    async fn send(
        &self,
        phone_number: &str,
        content: &str,
    ) -> Result<WebhookResponse, CourierError> {
        self.calls.lock().await.push(WebhookCall {
            phone_number: phone_number.to_string(),
            content: content.to_string(),
            at: Instant::now(),
        });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Self::accepted(202, None)))
    }
}
