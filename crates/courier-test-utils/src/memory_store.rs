// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message and delivery log store with failure injection.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::types::timestamp_now;
use courier_core::{
    CourierError, DeliveryLogEntry, DeliveryLogStore, Message, MessageStatus, MessageStore,
    MessageUpdate, NewDeliveryLog,
};

#[derive(Default)]
struct State {
    messages: BTreeMap<i64, Message>,
    logs: Vec<DeliveryLogEntry>,
    next_message_id: i64,
    next_log_id: i64,
    fail_append_for: HashSet<i64>,
    fail_sent_update_for: HashSet<i64>,
    fail_get_pending: bool,
}

/// `MessageStore` + `DeliveryLogStore` over a mutex-guarded map.
///
/// Ordering matches the SQLite store: pending oldest first with id as the
/// tie-break, logs newest first.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn injected(what: &str, id: i64) -> CourierError {
    CourierError::storage(format!("injected {what} failure for message {id}"))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `append` fail for this message id.
    pub async fn fail_append_for(&self, message_id: i64) {
        self.state.lock().await.fail_append_for.insert(message_id);
    }

    /// Make updates that move this message to `sent` fail. Other updates still apply.
    pub async fn fail_sent_update_for(&self, message_id: i64) {
        self.state
            .lock()
            .await
            .fail_sent_update_for
            .insert(message_id);
    }

    /// Make `get_pending` fail.
    pub async fn fail_get_pending(&self) {
        self.state.lock().await.fail_get_pending = true;
    }

    /// Every delivery log entry in append order.
    pub async fn all_logs(&self) -> Vec<DeliveryLogEntry> {
        self.state.lock().await.logs.clone()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create(&self, content: &str, phone_number: &str) -> Result<Message, CourierError> {
        let mut state = self.state.lock().await;
        state.next_message_id += 1;
        let now = timestamp_now();
        let message = Message {
            id: state.next_message_id,
            content: content.to_string(),
            phone_number: phone_number.to_string(),
            status: MessageStatus::Pending,
            external_message_id: None,
            sent_at: None,
            created_at: now.clone(),
            updated_at: now,
        };
        state.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn get_pending(&self, limit: usize) -> Result<Vec<Message>, CourierError> {
        let state = self.state.lock().await;
        if state.fail_get_pending {
            return Err(CourierError::storage("injected get_pending failure"));
        }
        let mut pending: Vec<Message> = state
            .messages
            .values()
            .filter(|m| m.status == MessageStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        pending.truncate(limit);
        Ok(pending)
    }

    async fn get_by_status(&self, status: MessageStatus) -> Result<Vec<Message>, CourierError> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .values()
            .filter(|m| m.status == status)
            .cloned()
            .collect())
    }

    async fn count_by_status(&self, status: MessageStatus) -> Result<u64, CourierError> {
        let state = self.state.lock().await;
        Ok(state.messages.values().filter(|m| m.status == status).count() as u64)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, CourierError> {
        Ok(self.state.lock().await.messages.get(&id).cloned())
    }

    async fn update(&self, id: i64, update: &MessageUpdate) -> Result<Message, CourierError> {
        let mut state = self.state.lock().await;
        if update.status == Some(MessageStatus::Sent) && state.fail_sent_update_for.contains(&id) {
            return Err(injected("sent update", id));
        }
        let message = state
            .messages
            .get_mut(&id)
            .ok_or_else(|| CourierError::NotFound {
                entity: "message",
                id: id.to_string(),
            })?;
        if let Some(status) = update.status {
            message.status = status;
        }
        if let Some(external_message_id) = &update.external_message_id {
            message.external_message_id = external_message_id.clone();
        }
        if let Some(sent_at) = &update.sent_at {
            message.sent_at = sent_at.clone();
        }
        message.updated_at = timestamp_now();
        Ok(message.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, CourierError> {
        let mut state = self.state.lock().await;
        let removed = state.messages.remove(&id).is_some();
        if removed {
            state.logs.retain(|l| l.message_id != id);
        }
        Ok(removed)
    }

    async fn list_sent(&self, limit: usize, offset: usize) -> Result<Vec<Message>, CourierError> {
        let state = self.state.lock().await;
        let mut sent: Vec<Message> = state
            .messages
            .values()
            .filter(|m| m.status == MessageStatus::Sent)
            .cloned()
            .collect();
        sent.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then(b.id.cmp(&a.id)));
        Ok(sent.into_iter().skip(offset).take(limit).collect())
    }
}

#[async_trait]
impl DeliveryLogStore for MemoryStore {
    async fn append(&self, entry: &NewDeliveryLog) -> Result<DeliveryLogEntry, CourierError> {
        let mut state = self.state.lock().await;
        if state.fail_append_for.contains(&entry.message_id) {
            return Err(injected("append", entry.message_id));
        }
        if !state.messages.contains_key(&entry.message_id) {
            return Err(CourierError::storage(format!(
                "message {} does not exist",
                entry.message_id
            )));
        }
        state.next_log_id += 1;
        let stored = DeliveryLogEntry {
            id: state.next_log_id,
            message_id: entry.message_id,
            external_message_id: entry.external_message_id.clone(),
            status: entry.status,
            response: entry.response.clone(),
            sent_at: entry.sent_at.clone(),
            created_at: timestamp_now(),
        };
        state.logs.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_message(
        &self,
        message_id: i64,
    ) -> Result<Vec<DeliveryLogEntry>, CourierError> {
        let state = self.state.lock().await;
        let mut logs: Vec<DeliveryLogEntry> = state
            .logs
            .iter()
            .filter(|l| l.message_id == message_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then(b.id.cmp(&a.id)));
        Ok(logs)
    }
}
