// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result cache whose every operation fails.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use courier_core::{CacheStats, CachedMessage, CourierError, ResultCache};

/// Used to prove cache failures never leak into message or log state.
#[derive(Default)]
pub struct FailingCache {
    put_attempts: AtomicUsize,
}

impl FailingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `put` was called.
    pub fn put_attempts(&self) -> usize {
        self.put_attempts.load(Ordering::SeqCst)
    }

    fn unavailable() -> CourierError {
        CourierError::Cache("cache unavailable".to_string())
    }
}

impl ResultCache for FailingCache {
    fn put(&self, _: i64, _: CachedMessage, _: Duration) -> Result<(), CourierError> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);
        Err(Self::unavailable())
    }

    fn get(&self, _: i64) -> Result<Option<CachedMessage>, CourierError> {
        Err(Self::unavailable())
    }

    fn has(&self, _: i64) -> Result<bool, CourierError> {
        Err(Self::unavailable())
    }

    fn remove(&self, _: i64) -> Result<bool, CourierError> {
        Err(Self::unavailable())
    }

    fn list_cached_ids(&self) -> Result<Vec<i64>, CourierError> {
        Err(Self::unavailable())
    }

    fn stats(&self) -> Result<CacheStats, CourierError> {
        Err(Self::unavailable())
    }

    fn purge_expired(&self) -> Result<usize, CourierError> {
        Err(Self::unavailable())
    }

    fn default_ttl(&self) -> Duration {
        Duration::from_secs(60)
    }
}
