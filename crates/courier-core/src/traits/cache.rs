// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort side index of recently sent messages.

use std::time::Duration;

use crate::error::CourierError;
use crate::types::{CacheStats, CachedMessage};

/// Non-authoritative cache of sent message summaries.
///
/// Nothing reads this for correctness. Callers on the dispatch path must
/// swallow every error it returns.
pub trait ResultCache: Send + Sync {
    fn put(&self, message_id: i64, summary: CachedMessage, ttl: Duration)
    -> Result<(), CourierError>;

    fn get(&self, message_id: i64) -> Result<Option<CachedMessage>, CourierError>;

    fn has(&self, message_id: i64) -> Result<bool, CourierError>;

    /// Returns whether an entry was removed.
    fn remove(&self, message_id: i64) -> Result<bool, CourierError>;

    /// Ids of all live entries.
    fn list_cached_ids(&self) -> Result<Vec<i64>, CourierError>;

    fn stats(&self) -> Result<CacheStats, CourierError>;

    /// Drop every expired entry. Returns how many were removed.
    fn purge_expired(&self) -> Result<usize, CourierError>;

    /// Time-to-live applied by the dispatch pipeline.
    fn default_ttl(&self) -> Duration;
}
