// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for messages and their delivery logs.
//!
//! Stores expose CRUD-level operations only. Business rules (validation,
//! status transitions) live in the dispatch crate.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DeliveryLogEntry, Message, MessageStatus, MessageUpdate, NewDeliveryLog};

/// Adapter for persistence backends with an explicit open/close lifecycle.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), CourierError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), CourierError>;
}

/// Durable record of messages and their lifecycle state.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message. Status is always `pending` regardless of caller intent.
    async fn create(&self, content: &str, phone_number: &str) -> Result<Message, CourierError>;

    /// Up to `limit` pending messages, oldest `created_at` first.
    async fn get_pending(&self, limit: usize) -> Result<Vec<Message>, CourierError>;

    async fn get_by_status(&self, status: MessageStatus) -> Result<Vec<Message>, CourierError>;

    async fn count_by_status(&self, status: MessageStatus) -> Result<u64, CourierError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, CourierError>;

    /// Apply field changes and bump `updated_at`.
    ///
    /// Returns [`CourierError::NotFound`] if no such message exists.
    async fn update(&self, id: i64, update: &MessageUpdate) -> Result<Message, CourierError>;

    /// Set the status column only.
    async fn update_status(&self, id: i64, status: MessageStatus) -> Result<Message, CourierError> {
        let update = MessageUpdate {
            status: Some(status),
            ..MessageUpdate::default()
        };
        self.update(id, &update).await
    }

    /// Delete a message and (by cascade) its delivery logs. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, CourierError>;

    /// Sent messages, most recently sent first.
    async fn list_sent(&self, limit: usize, offset: usize) -> Result<Vec<Message>, CourierError>;
}

/// Durable append-only record of delivery attempts.
#[async_trait]
pub trait DeliveryLogStore: Send + Sync {
    /// Append one entry atomically.
    async fn append(&self, entry: &NewDeliveryLog) -> Result<DeliveryLogEntry, CourierError>;

    /// All entries for a message, newest `sent_at` first.
    async fn list_for_message(&self, message_id: i64)
    -> Result<Vec<DeliveryLogEntry>, CourierError>;

    /// The newest entry for a message, if any.
    async fn latest_for_message(
        &self,
        message_id: i64,
    ) -> Result<Option<DeliveryLogEntry>, CourierError> {
        Ok(self.list_for_message(message_id).await?.into_iter().next())
    }

    /// Entries for several messages at once, each message's entries newest first.
    async fn list_for_messages(
        &self,
        message_ids: &[i64],
    ) -> Result<Vec<DeliveryLogEntry>, CourierError> {
        let mut entries = Vec::new();
        for id in message_ids {
            entries.extend(self.list_for_message(*id).await?);
        }
        Ok(entries)
    }
}
