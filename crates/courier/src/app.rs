// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide wiring of stores, webhook client, cache, and pipeline.
//!
//! Every collaborator is constructed once here and passed down explicitly.

use std::sync::Arc;

use courier_cache::MemoryResultCache;
use courier_config::CourierConfig;
use courier_core::{
    CourierError, DeliveryLogStore, MessageStore, ResultCache, StorageAdapter, WebhookAdapter,
};
use courier_dispatch::{DispatchPipeline, MessageService};
use courier_storage::SqliteStorage;
use courier_webhook::WebhookClient;
use tracing::{debug, warn};

pub struct App {
    pub storage: Arc<SqliteStorage>,
    pub webhook: Arc<WebhookClient>,
    pub cache: Option<Arc<MemoryResultCache>>,
    pub pipeline: DispatchPipeline,
    pub service: MessageService,
}

impl App {
    /// Open storage and assemble the dispatch stack from configuration.
    pub async fn open(config: &CourierConfig) -> Result<Self, CourierError> {
        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let webhook = Arc::new(WebhookClient::new(&config.webhook)?);
        if !webhook.is_configured() {
            warn!("webhook.url is not configured; every delivery attempt will fail");
        }

        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(MemoryResultCache::new(&config.cache)));

        let messages: Arc<dyn MessageStore> = storage.clone();
        let logs: Arc<dyn DeliveryLogStore> = storage.clone();
        let webhook_dyn: Arc<dyn WebhookAdapter> = webhook.clone();
        let cache_dyn = cache.clone().map(|c| c as Arc<dyn ResultCache>);

        let pipeline = DispatchPipeline::new(
            messages.clone(),
            logs.clone(),
            webhook_dyn,
            cache_dyn.clone(),
            config.dispatch.batch_size,
            config.dispatch.throttle(),
        );
        let service = MessageService::new(messages, logs, cache_dyn);

        debug!(
            batch_size = config.dispatch.batch_size,
            throttle_ms = config.dispatch.throttle_ms,
            cache_enabled = config.cache.enabled,
            "dispatch stack assembled"
        );

        Ok(Self {
            storage,
            webhook,
            cache,
            pipeline,
            service,
        })
    }

    /// Checkpoint the database before exit.
    pub async fn close(&self) -> Result<(), CourierError> {
        self.storage.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{MessageStatus, PluginAdapter};

    fn config_in(dir: &tempfile::TempDir) -> CourierConfig {
        let mut config = CourierConfig::default();
        config.storage.database_path = dir.path().join("courier.db").display().to_string();
        config
    }

    #[tokio::test]
    async fn open_wires_stack_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::open(&config_in(&dir)).await.unwrap();

        assert!(app.cache.is_some());
        assert!(!app.webhook.is_configured());
        assert_eq!(app.pipeline.batch_size(), 2);

        let msg = app.service.create_message("hi", "+1").await.unwrap();
        assert_eq!(msg.status, MessageStatus::Pending);
        assert!(app.storage.health_check().await.is_ok());
        app.close().await.unwrap();
    }

    #[tokio::test]
    async fn cache_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.cache.enabled = false;

        let app = App::open(&config).await.unwrap();
        assert!(app.cache.is_none());
        app.close().await.unwrap();
    }
}
