// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end dispatch scenarios.
//!
//! `TestHarness` assembles the production stack against a temp SQLite
//! database and a caller-supplied endpoint URL (usually a wiremock server):
//! [`SqliteStorage`], [`WebhookClient`], [`MemoryResultCache`], a
//! [`DispatchPipeline`], and a [`MessageService`].

use std::sync::Arc;
use std::time::Duration;

use courier_cache::MemoryResultCache;
use courier_config::model::{CacheConfig, StorageConfig, WebhookConfig};
use courier_core::{
    CourierError, DeliveryLogStore, MessageStore, ResultCache, StorageAdapter, WebhookAdapter,
};
use courier_dispatch::{DispatchPipeline, MessageService};
use courier_storage::SqliteStorage;
use courier_webhook::WebhookClient;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    webhook_url: Option<String>,
    auth_key: Option<String>,
    timeout: Duration,
    batch_size: usize,
    throttle: Duration,
    cache_enabled: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            webhook_url: None,
            auth_key: None,
            timeout: Duration::from_secs(5),
            batch_size: 2,
            throttle: Duration::ZERO,
            cache_enabled: true,
        }
    }

    /// Endpoint the webhook client posts to. Left unset, every send fails with a config error.
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    pub fn with_auth_key(mut self, key: impl Into<String>) -> Self {
        self.auth_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Pause after each message. Defaults to zero so tests stay fast.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    /// Build the harness, opening a fresh SQLite database in a temp directory.
    pub async fn build(self) -> Result<TestHarness, CourierError> {
        let temp_dir = tempfile::TempDir::new().map_err(CourierError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        }));
        storage.initialize().await?;

        let webhook = Arc::new(
            WebhookClient::new(&WebhookConfig {
                url: self.webhook_url,
                auth_key: self.auth_key,
                timeout_secs: 30,
            })?
            .with_timeout(self.timeout),
        );

        let cache = self
            .cache_enabled
            .then(|| Arc::new(MemoryResultCache::new(&CacheConfig::default())));

        let messages: Arc<dyn MessageStore> = storage.clone();
        let logs: Arc<dyn DeliveryLogStore> = storage.clone();
        let webhook_dyn: Arc<dyn WebhookAdapter> = webhook.clone();
        let cache_dyn = cache.clone().map(|c| c as Arc<dyn ResultCache>);

        let pipeline = DispatchPipeline::new(
            messages.clone(),
            logs.clone(),
            webhook_dyn,
            cache_dyn.clone(),
            self.batch_size,
            self.throttle,
        );
        let service = MessageService::new(messages, logs, cache_dyn);

        Ok(TestHarness {
            storage,
            webhook,
            cache,
            pipeline,
            service,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete dispatch stack over temp storage.
pub struct TestHarness {
    /// SQLite storage (temp DB, removed on drop).
    pub storage: Arc<SqliteStorage>,
    /// Real HTTP webhook client.
    pub webhook: Arc<WebhookClient>,
    /// In-memory result cache, unless disabled.
    pub cache: Option<Arc<MemoryResultCache>>,
    pub pipeline: DispatchPipeline,
    pub service: MessageService,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Checkpoint and close the database.
    pub async fn close(&self) -> Result<(), CourierError> {
        self.storage.close().await
    }
}
