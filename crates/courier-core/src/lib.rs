// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier message dispatch service.
//!
//! This crate provides the error type, the domain types, and the adapter
//! traits that the storage, webhook, cache, and dispatch crates implement
//! or consume.

pub mod error;
pub mod traits;
pub mod types;

pub use error::CourierError;
pub use types::{
    AdapterType, CacheStats, CachedMessage, DeliveryLogEntry, DeliveryStatus, HealthStatus,
    Message, MessageStatus, MessageUpdate, NewDeliveryLog, WebhookResponse,
};

pub use traits::{
    DeliveryLogStore, MessageStore, PluginAdapter, ResultCache, StorageAdapter, WebhookAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn message_status_string_round_trip() {
        for status in MessageStatus::ALL {
            let s = status.to_string();
            assert_eq!(MessageStatus::from_str(&s).unwrap(), status);
        }
        assert_eq!(MessageStatus::Pending.to_string(), "pending");
        assert!(MessageStatus::from_str("queued").is_err());
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!MessageStatus::Pending.is_terminal());
        assert!(MessageStatus::Sent.is_terminal());
        assert!(MessageStatus::Failed.is_terminal());
    }

    #[test]
    fn delivery_status_serializes_lowercase() {
        let json = serde_json::to_string(&DeliveryStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
        assert_eq!(DeliveryStatus::from_str("sent").unwrap(), DeliveryStatus::Sent);
    }

    #[test]
    fn message_update_constructors() {
        let sent = MessageUpdate::sent(Some("abc".into()), "2026-01-01T00:00:00.000Z".into());
        assert_eq!(sent.status, Some(MessageStatus::Sent));
        assert_eq!(sent.external_message_id, Some(Some("abc".to_string())));
        assert!(sent.sent_at.is_some());

        let failed = MessageUpdate::failed();
        assert_eq!(failed.status, Some(MessageStatus::Failed));
        assert!(failed.external_message_id.is_none());
        assert!(failed.sent_at.is_none());

        assert!(MessageUpdate::default().is_empty());
        assert!(!failed.is_empty());
    }

    #[test]
    fn timestamps_sort_lexicographically() {
        let a = types::timestamp_now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = types::timestamp_now();
        assert_eq!(a.len(), "2026-01-01T00:00:00.000Z".len());
        assert!(a.ends_with('Z'));
        assert!(a < b, "{a} should sort before {b}");
    }

    #[test]
    fn transport_classification() {
        assert!(
            CourierError::Timeout {
                duration: std::time::Duration::from_secs(30)
            }
            .is_transport()
        );
        assert!(
            CourierError::Transport {
                message: "refused".into(),
                source: None
            }
            .is_transport()
        );
        assert!(!CourierError::Config("no url".into()).is_transport());
    }

    #[test]
    fn cached_summary_from_delivery() {
        let message = Message {
            id: 7,
            content: "Hello".into(),
            phone_number: "+1234567890".into(),
            status: MessageStatus::Pending,
            external_message_id: None,
            sent_at: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let response = WebhookResponse {
            success: true,
            external_message_id: Some("abc-123".into()),
            body: serde_json::json!({"messageId": "abc-123"}),
            http_status: 202,
        };
        let summary = CachedMessage::from_delivery(&message, &response, "2026-01-01T00:00:05.000Z");
        assert_eq!(summary.message_id.as_deref(), Some("abc-123"));
        assert_eq!(summary.phone_number, "+1234567890");
        assert_eq!(summary.status, MessageStatus::Sent);
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _message_store(_: &dyn MessageStore) {}
        fn _log_store(_: &dyn DeliveryLogStore) {}
        fn _webhook(_: &dyn WebhookAdapter) {}
        fn _cache(_: &dyn ResultCache) {}
        fn _storage(_: &dyn StorageAdapter) {}
    }
}
