// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Creation and listing surface over the stores.

use std::collections::HashMap;
use std::sync::Arc;

use courier_core::types::{MAX_CONTENT_CHARS, MAX_PHONE_NUMBER_CHARS};
use courier_core::{
    CachedMessage, CourierError, DeliveryLogEntry, DeliveryLogStore, Message, MessageStatus,
    MessageStore, ResultCache,
};
use serde::Serialize;
use tracing::{debug, error, info};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PER_PAGE: usize = 15;

/// Largest page size a caller may request.
pub const MAX_PER_PAGE: usize = 100;

/// A sent message together with its delivery history, newest entry first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentMessage {
    #[serde(flatten)]
    pub message: Message,
    pub delivery_logs: Vec<DeliveryLogEntry>,
}

/// Page metadata for [`SentPage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: usize,
    pub last_page: usize,
    pub per_page: usize,
    pub total: u64,
    /// 1-based position of the first item on this page, `None` when empty.
    pub from: Option<u64>,
    /// 1-based position of the last item on this page, `None` when empty.
    pub to: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentPage {
    pub data: Vec<SentMessage>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub sent: u64,
    pub failed: u64,
}

/// Message creation, listing, and lookup on top of the injected stores.
pub struct MessageService {
    messages: Arc<dyn MessageStore>,
    logs: Arc<dyn DeliveryLogStore>,
    cache: Option<Arc<dyn ResultCache>>,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        logs: Arc<dyn DeliveryLogStore>,
        cache: Option<Arc<dyn ResultCache>>,
    ) -> Self {
        Self {
            messages,
            logs,
            cache,
        }
    }

    /// Validate and persist a new pending message.
    ///
    /// Nothing is written when validation fails.
    pub async fn create_message(
        &self,
        content: &str,
        phone_number: &str,
    ) -> Result<Message, CourierError> {
        validate_new_message(content, phone_number)?;
        let message = self.messages.create(content, phone_number.trim()).await?;
        info!(message_id = message.id, "message created");
        Ok(message)
    }

    /// Sent messages with their delivery logs, most recently sent first.
    ///
    /// `page` is 1-based; zero is treated as 1. `per_page` defaults to
    /// [`DEFAULT_PER_PAGE`] and is clamped to `1..=MAX_PER_PAGE`.
    pub async fn list_sent(
        &self,
        page: usize,
        per_page: Option<usize>,
    ) -> Result<SentPage, CourierError> {
        let page = page.max(1);
        let per_page = per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let offset = (page - 1).saturating_mul(per_page);

        let total = self.messages.count_by_status(MessageStatus::Sent).await?;
        let messages = self.messages.list_sent(per_page, offset).await?;

        let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();
        let mut logs_by_message: HashMap<i64, Vec<DeliveryLogEntry>> = HashMap::new();
        for entry in self.logs.list_for_messages(&ids).await? {
            logs_by_message
                .entry(entry.message_id)
                .or_default()
                .push(entry);
        }

        let pagination = paginate(page, per_page, total, messages.len());
        let data = messages
            .into_iter()
            .map(|message| SentMessage {
                delivery_logs: logs_by_message.remove(&message.id).unwrap_or_default(),
                message,
            })
            .collect();

        Ok(SentPage { data, pagination })
    }

    pub async fn status_counts(&self) -> Result<StatusCounts, CourierError> {
        Ok(StatusCounts {
            pending: self.messages.count_by_status(MessageStatus::Pending).await?,
            sent: self.messages.count_by_status(MessageStatus::Sent).await?,
            failed: self.messages.count_by_status(MessageStatus::Failed).await?,
        })
    }

    /// Summary of a sent message: the cache if it has one, else the store.
    ///
    /// Returns `None` when the message does not exist or is not sent.
    pub async fn lookup_sent(&self, id: i64) -> Result<Option<CachedMessage>, CourierError> {
        if let Some(cache) = &self.cache {
            match cache.get(id) {
                Ok(Some(summary)) => {
                    debug!(message_id = id, "result cache hit");
                    return Ok(Some(summary));
                }
                Ok(None) => {}
                Err(e) => error!(message_id = id, error = %e, "result cache read failed (ignored)"),
            }
        }

        let Some(message) = self.messages.find_by_id(id).await? else {
            return Ok(None);
        };
        if message.status != MessageStatus::Sent {
            return Ok(None);
        }
        Ok(Some(CachedMessage {
            message_id: message.external_message_id,
            sent_at: message.sent_at.unwrap_or_default(),
            phone_number: message.phone_number,
            content: message.content,
            status: MessageStatus::Sent,
        }))
    }
}

/// Creation-path checks. Lengths are counted in characters, not bytes.
pub fn validate_new_message(content: &str, phone_number: &str) -> Result<(), CourierError> {
    if content.is_empty() {
        return Err(CourierError::Validation(
            "content must not be empty".to_string(),
        ));
    }
    let content_chars = content.chars().count();
    if content_chars > MAX_CONTENT_CHARS {
        return Err(CourierError::Validation(format!(
            "content is {content_chars} characters, maximum is {MAX_CONTENT_CHARS}"
        )));
    }

    let phone_number = phone_number.trim();
    if phone_number.is_empty() {
        return Err(CourierError::Validation(
            "phone_number must not be empty".to_string(),
        ));
    }
    if phone_number.chars().count() > MAX_PHONE_NUMBER_CHARS {
        return Err(CourierError::Validation(format!(
            "phone_number must be at most {MAX_PHONE_NUMBER_CHARS} characters"
        )));
    }
    Ok(())
}

fn paginate(page: usize, per_page: usize, total: u64, on_page: usize) -> Pagination {
    let per_page_u64 = per_page as u64;
    let last_page = total.div_ceil(per_page_u64).max(1) as usize;
    let (from, to) = if on_page == 0 {
        (None, None)
    } else {
        let from = (page as u64 - 1) * per_page_u64 + 1;
        (Some(from), Some(from + on_page as u64 - 1))
    };
    Pagination {
        current_page: page,
        last_page,
        per_page,
        total,
        from,
        to,
    }
}
