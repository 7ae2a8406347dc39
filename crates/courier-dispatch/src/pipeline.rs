// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatch state machine.
//!
//! Each pending message gets exactly one delivery attempt per pass:
//! `pending -> sent` on a 2xx response, `pending -> failed` otherwise. Every
//! attempt appends one delivery log entry. Batches run strictly sequentially
//! with a fixed pause after each message, which caps the outbound call rate.

use std::sync::Arc;
use std::time::Duration;

use courier_core::types::timestamp_now;
use courier_core::{
    CachedMessage, CourierError, DeliveryLogStore, DeliveryStatus, Message, MessageStore,
    MessageUpdate, NewDeliveryLog, ResultCache, WebhookAdapter, WebhookResponse,
};
use tracing::{debug, error, info, warn};

/// Result of one delivery attempt, as seen by the batch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The endpoint accepted the message.
    Sent { external_message_id: Option<String> },
    /// The endpoint rejected the message or could not be reached.
    Failed { reason: String },
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Tally of one `process_batch` pass, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Moves pending messages to `sent` or `failed` through the webhook.
///
/// Collaborators are injected once at construction; the pipeline holds no
/// state between passes.
pub struct DispatchPipeline {
    messages: Arc<dyn MessageStore>,
    logs: Arc<dyn DeliveryLogStore>,
    webhook: Arc<dyn WebhookAdapter>,
    cache: Option<Arc<dyn ResultCache>>,
    batch_size: usize,
    throttle: Duration,
}

impl DispatchPipeline {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        logs: Arc<dyn DeliveryLogStore>,
        webhook: Arc<dyn WebhookAdapter>,
        cache: Option<Arc<dyn ResultCache>>,
        batch_size: usize,
        throttle: Duration,
    ) -> Self {
        Self {
            messages,
            logs,
            webhook,
            cache,
            batch_size,
            throttle,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    /// Attempt delivery of one message and record the outcome.
    ///
    /// Webhook failures (configuration, transport, non-2xx) are recorded and
    /// returned as [`SendOutcome::Failed`]. `Err` means a store write failed,
    /// leaving the message state for the caller to repair.
    pub async fn send_one(&self, message: &Message) -> Result<SendOutcome, CourierError> {
        let attempt = self
            .webhook
            .send(&message.phone_number, &message.content)
            .await;
        let sent_at = timestamp_now();

        let http_status = attempt.as_ref().map(|r| r.http_status).ok();
        let (entry, outcome) = match attempt {
            Ok(response) if response.success => {
                let entry = NewDeliveryLog {
                    message_id: message.id,
                    external_message_id: response.external_message_id.clone(),
                    status: DeliveryStatus::Sent,
                    response: audited_body(&response),
                    sent_at: sent_at.clone(),
                };
                let outcome = SendOutcome::Sent {
                    external_message_id: response.external_message_id.clone(),
                };
                self.logs.append(&entry).await?;
                self.messages
                    .update(
                        message.id,
                        &MessageUpdate::sent(response.external_message_id.clone(), sent_at.clone()),
                    )
                    .await?;
                self.remember(message, CachedMessage::from_delivery(message, &response, &sent_at));
                (entry, outcome)
            }
            Ok(response) => {
                let entry = NewDeliveryLog {
                    message_id: message.id,
                    external_message_id: None,
                    status: DeliveryStatus::Failed,
                    response: response.body,
                    sent_at,
                };
                let outcome = SendOutcome::Failed {
                    reason: format!("webhook returned HTTP {}", response.http_status),
                };
                self.record_failure(message, &entry).await?;
                (entry, outcome)
            }
            Err(e) => {
                let entry = NewDeliveryLog {
                    message_id: message.id,
                    external_message_id: None,
                    status: DeliveryStatus::Failed,
                    response: serde_json::json!({ "error": e.to_string() }),
                    sent_at,
                };
                let outcome = SendOutcome::Failed {
                    reason: e.to_string(),
                };
                self.record_failure(message, &entry).await?;
                (entry, outcome)
            }
        };

        match &outcome {
            SendOutcome::Sent {
                external_message_id,
            } => info!(
                message_id = message.id,
                external_message_id = external_message_id.as_deref().unwrap_or(""),
                http_status = http_status.unwrap_or_default(),
                "message sent"
            ),
            SendOutcome::Failed { reason } => warn!(
                message_id = message.id,
                http_status = http_status.unwrap_or_default(),
                sent_at = %entry.sent_at,
                reason = %reason,
                "message delivery failed"
            ),
        }
        Ok(outcome)
    }

    async fn record_failure(
        &self,
        message: &Message,
        entry: &NewDeliveryLog,
    ) -> Result<(), CourierError> {
        self.logs.append(entry).await?;
        self.messages
            .update(message.id, &MessageUpdate::failed())
            .await?;
        Ok(())
    }

    /// Cache write for a delivered message. Errors are logged and dropped.
    fn remember(&self, message: &Message, summary: CachedMessage) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(e) = cache.put(message.id, summary, cache.default_ttl()) {
            error!(message_id = message.id, error = %e, "result cache write failed (ignored)");
        }
    }

    /// Sweep expired entries out of the result cache. Errors are logged and dropped.
    pub fn purge_cache(&self) -> usize {
        let Some(cache) = &self.cache else {
            return 0;
        };
        match cache.purge_expired() {
            Ok(purged) => purged,
            Err(e) => {
                error!(error = %e, "result cache purge failed (ignored)");
                0
            }
        }
    }

    /// One pass: up to `batch_size` pending messages, oldest first, one at a time.
    ///
    /// Never fails. A message whose processing errors is forced to `failed`
    /// and the loop moves on. The throttle pause follows every message.
    pub async fn process_batch(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();

        let pending = match self.messages.get_pending(self.batch_size).await {
            Ok(pending) => pending,
            Err(e) => {
                error!(error = %e, "failed to fetch pending messages");
                return summary;
            }
        };

        if pending.is_empty() {
            debug!("no pending messages");
            return summary;
        }

        for message in &pending {
            summary.attempted += 1;
            match self.send_one(message).await {
                Ok(outcome) if outcome.is_sent() => summary.sent += 1,
                Ok(_) => summary.failed += 1,
                Err(e) => {
                    error!(
                        message_id = message.id,
                        error = %e,
                        "unexpected error while sending, marking message failed"
                    );
                    self.force_failed(message).await;
                    summary.failed += 1;
                }
            }
            tokio::time::sleep(self.throttle).await;
        }

        info!(
            attempted = summary.attempted,
            sent = summary.sent,
            failed = summary.failed,
            "batch processed"
        );
        summary
    }

    async fn force_failed(&self, message: &Message) {
        if let Err(e) = self
            .messages
            .update(message.id, &MessageUpdate::failed())
            .await
        {
            error!(
                message_id = message.id,
                error = %e,
                "could not mark message failed"
            );
        }
    }
}

/// Response body recorded for a successful delivery.
///
/// An identifier resolved from `X-Request-ID` or `id` is written back under
/// `messageId` so the audit payload agrees with `external_message_id`.
fn audited_body(response: &WebhookResponse) -> serde_json::Value {
    let mut body = response.body.clone();
    if let (Some(id), Some(fields)) = (&response.external_message_id, body.as_object_mut()) {
        fields
            .entry("messageId")
            .or_insert_with(|| serde_json::Value::String(id.clone()));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn accepted(body: serde_json::Value, id: Option<&str>) -> WebhookResponse {
        WebhookResponse {
            success: true,
            external_message_id: id.map(str::to_string),
            body,
            http_status: 202,
        }
    }

    #[test]
    fn fallback_identifier_is_written_into_audit_body() {
        let body = audited_body(&accepted(json!({"id": "body-id"}), Some("req-42")));
        assert_eq!(body, json!({"id": "body-id", "messageId": "req-42"}));

        let body = audited_body(&accepted(json!({}), Some("req-42")));
        assert_eq!(body, json!({"messageId": "req-42"}));
    }

    #[test]
    fn audit_body_keeps_existing_message_id_and_absent_identifier() {
        let body = audited_body(&accepted(json!({"messageId": "abc"}), Some("abc")));
        assert_eq!(body, json!({"messageId": "abc"}));

        let body = audited_body(&accepted(json!({"message": "Accepted"}), None));
        assert_eq!(body, json!({"message": "Accepted"}));
    }
}
