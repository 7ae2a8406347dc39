// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the stores, the webhook client, and the dispatch pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Maximum number of characters a message body may carry.
pub const MAX_CONTENT_CHARS: usize = 160;

/// Maximum number of characters in a destination phone number.
pub const MAX_PHONE_NUMBER_CHARS: usize = 20;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Webhook,
    Cache,
}

/// Lifecycle state of a message.
///
/// `Pending` is the only non-terminal state. The dispatch pipeline moves a
/// message to `Sent` or `Failed` exactly once and never back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

impl MessageStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [MessageStatus; 3] = [Self::Pending, Self::Sent, Self::Failed];

    /// Whether no further transition is allowed out of this status.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Outcome of one specific delivery attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// A unit of content plus destination awaiting or having completed delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub content: String,
    pub phone_number: String,
    pub status: MessageStatus,
    /// Identifier assigned by the delivery endpoint on success.
    pub external_message_id: Option<String>,
    /// Set only on transition to `Sent`.
    pub sent_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Field changes applied by [`MessageStore::update`](crate::traits::MessageStore::update).
///
/// `None` leaves a column untouched; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageUpdate {
    pub status: Option<MessageStatus>,
    pub external_message_id: Option<Option<String>>,
    pub sent_at: Option<Option<String>>,
}

impl MessageUpdate {
    /// Transition to `Sent`, recording the endpoint identifier and send time.
    pub fn sent(external_message_id: Option<String>, sent_at: String) -> Self {
        Self {
            status: Some(MessageStatus::Sent),
            external_message_id: Some(external_message_id),
            sent_at: Some(Some(sent_at)),
        }
    }

    /// Transition to `Failed`. Identifier and send time stay unset.
    pub fn failed() -> Self {
        Self {
            status: Some(MessageStatus::Failed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.external_message_id.is_none() && self.sent_at.is_none()
    }
}

/// Immutable record of one delivery attempt's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLogEntry {
    pub id: i64,
    pub message_id: i64,
    pub external_message_id: Option<String>,
    pub status: DeliveryStatus,
    /// Raw response body, or `{"error": ...}` when no response was obtained.
    pub response: serde_json::Value,
    pub sent_at: String,
    pub created_at: String,
}

/// A delivery log entry before it has been persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeliveryLog {
    pub message_id: i64,
    pub external_message_id: Option<String>,
    pub status: DeliveryStatus,
    pub response: serde_json::Value,
    pub sent_at: String,
}

/// Normalized result of one call to the delivery endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    /// True iff the HTTP status was in the 2xx range.
    pub success: bool,
    /// Identifier extracted from the response, only populated on success.
    pub external_message_id: Option<String>,
    /// Parsed JSON body, or an empty object when the body was not JSON.
    pub body: serde_json::Value,
    pub http_status: u16,
}

/// Summary stored in the result cache for a successfully sent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedMessage {
    /// Identifier assigned by the delivery endpoint, if any.
    pub message_id: Option<String>,
    pub sent_at: String,
    pub phone_number: String,
    pub content: String,
    pub status: MessageStatus,
}

impl CachedMessage {
    /// Build the summary for a message that was just delivered.
    pub fn from_delivery(message: &Message, response: &WebhookResponse, sent_at: &str) -> Self {
        Self {
            message_id: response.external_message_id.clone(),
            sent_at: sent_at.to_string(),
            phone_number: message.phone_number.clone(),
            content: message.content.clone(),
            status: MessageStatus::Sent,
        }
    }
}

/// Introspection snapshot of the result cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub count: usize,
    pub ttl_secs: u64,
    pub prefix: String,
}

/// Timestamp format used by every persisted column.
///
/// Millisecond precision with a fixed width keeps the strings lexicographically sortable.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Current UTC time in [`TIMESTAMP_FORMAT`].
pub fn timestamp_now() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}
