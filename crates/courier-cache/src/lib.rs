// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory result cache for recently sent messages.
//!
//! Entries are keyed `<prefix><message_id>` and expire after a fixed TTL.
//! Expired entries are dropped lazily on access or in bulk via
//! [`ResultCache::purge_expired`], which the dispatch scheduler calls once per pass.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use courier_config::model::CacheConfig;
use courier_core::{
    AdapterType, CacheStats, CachedMessage, CourierError, HealthStatus, PluginAdapter, ResultCache,
};
use dashmap::DashMap;
use tracing::debug;

struct CacheEntry {
    summary: CachedMessage,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Concurrent TTL cache backed by a [`DashMap`].
pub struct MemoryResultCache {
    entries: DashMap<String, CacheEntry>,
    prefix: String,
    ttl: Duration,
}

impl MemoryResultCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_settings(config.prefix.clone(), config.ttl())
    }

    pub fn with_settings(prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            prefix: prefix.into(),
            ttl,
        }
    }

    fn key(&self, message_id: i64) -> String {
        format!("{}{message_id}", self.prefix)
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }
}

impl ResultCache for MemoryResultCache {
    fn put(
        &self,
        message_id: i64,
        summary: CachedMessage,
        ttl: Duration,
    ) -> Result<(), CourierError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CourierError::Cache(format!("ttl {ttl:?} overflows the clock")))?;
        self.entries
            .insert(self.key(message_id), CacheEntry { summary, expires_at });
        Ok(())
    }

    fn get(&self, message_id: i64) -> Result<Option<CachedMessage>, CourierError> {
        let key = self.key(message_id);
        let now = Instant::now();
        if let Some(entry) = self.entries.get(&key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.summary.clone()));
            }
        }
        self.entries.remove_if(&key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    fn has(&self, message_id: i64) -> Result<bool, CourierError> {
        Ok(self.get(message_id)?.is_some())
    }

    fn remove(&self, message_id: i64) -> Result<bool, CourierError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(&self.key(message_id))
            .is_some_and(|(_, entry)| !entry.is_expired(now)))
    }

    fn list_cached_ids(&self) -> Result<Vec<i64>, CourierError> {
        let now = Instant::now();
        let mut ids: Vec<i64> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .filter_map(|entry| entry.key().strip_prefix(&self.prefix)?.parse().ok())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn stats(&self) -> Result<CacheStats, CourierError> {
        Ok(CacheStats {
            count: self.live_count(),
            ttl_secs: self.ttl.as_secs(),
            prefix: self.prefix.clone(),
        })
    }

    fn purge_expired(&self) -> Result<usize, CourierError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!(purged, "expired cache entries purged");
        }
        Ok(purged)
    }

    fn default_ttl(&self) -> Duration {
        self.ttl
    }
}

#[async_trait]
impl PluginAdapter for MemoryResultCache {
    fn name(&self) -> &str {
        "memory-cache"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        self.entries.clear();
        Ok(())
    }
}
