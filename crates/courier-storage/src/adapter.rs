// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use courier_config::model::StorageConfig;
use courier_core::{
    AdapterType, CourierError, DeliveryLogEntry, DeliveryLogStore, HealthStatus, Message,
    MessageStatus, MessageStore, MessageUpdate, NewDeliveryLog, PluginAdapter, StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed message and delivery log store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](StorageAdapter::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, CourierError> {
        self.db.get().ok_or_else(|| CourierError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), CourierError> {
        db.connection()
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("storage not initialized".to_string()));
        };
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), CourierError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| CourierError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), CourierError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteStorage {
    async fn create(&self, content: &str, phone_number: &str) -> Result<Message, CourierError> {
        queries::messages::create_message(self.db()?, content, phone_number).await
    }

    async fn get_pending(&self, limit: usize) -> Result<Vec<Message>, CourierError> {
        queries::messages::get_pending(self.db()?, limit).await
    }

    async fn get_by_status(&self, status: MessageStatus) -> Result<Vec<Message>, CourierError> {
        queries::messages::get_by_status(self.db()?, status).await
    }

    async fn count_by_status(&self, status: MessageStatus) -> Result<u64, CourierError> {
        queries::messages::count_by_status(self.db()?, status).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, CourierError> {
        queries::messages::find_by_id(self.db()?, id).await
    }

    async fn update(&self, id: i64, update: &MessageUpdate) -> Result<Message, CourierError> {
        queries::messages::update_message(self.db()?, id, update).await
    }

    async fn delete(&self, id: i64) -> Result<bool, CourierError> {
        queries::messages::delete_message(self.db()?, id).await
    }

    async fn list_sent(&self, limit: usize, offset: usize) -> Result<Vec<Message>, CourierError> {
        queries::messages::list_sent(self.db()?, limit, offset).await
    }
}

#[async_trait]
impl DeliveryLogStore for SqliteStorage {
    async fn append(&self, entry: &NewDeliveryLog) -> Result<DeliveryLogEntry, CourierError> {
        queries::delivery_logs::append_log(self.db()?, entry).await
    }

    async fn list_for_message(
        &self,
        message_id: i64,
    ) -> Result<Vec<DeliveryLogEntry>, CourierError> {
        queries::delivery_logs::list_for_message(self.db()?, message_id).await
    }

    async fn list_for_messages(
        &self,
        message_ids: &[i64],
    ) -> Result<Vec<DeliveryLogEntry>, CourierError> {
        queries::delivery_logs::list_for_messages(self.db()?, message_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::DeliveryStatus;
    use tempfile::tempdir;

    fn test_config(dir: &tempfile::TempDir) -> StorageConfig {
        StorageConfig {
            database_path: dir.path().join("courier.db").display().to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(test_config(&dir));

        let err = storage.get_pending(1).await.unwrap_err();
        assert!(err.to_string().contains("not initialized"));
        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn initialize_twice_is_an_error() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(test_config(&dir));
        storage.initialize().await.unwrap();
        let err = storage.initialize().await.unwrap_err();
        assert!(err.to_string().contains("already initialized"));
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn full_delivery_lifecycle() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(test_config(&dir));
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        assert_eq!(storage.adapter_type(), AdapterType::Storage);

        let msg = storage.create("hello", "+905551112233").await.unwrap();
        assert_eq!(storage.get_pending(10).await.unwrap().len(), 1);

        let entry = NewDeliveryLog {
            message_id: msg.id,
            external_message_id: Some("ext-9".to_string()),
            status: DeliveryStatus::Sent,
            response: serde_json::json!({"messageId": "ext-9"}),
            sent_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        storage.append(&entry).await.unwrap();
        let sent = storage
            .update(
                msg.id,
                &MessageUpdate::sent(Some("ext-9".to_string()), entry.sent_at.clone()),
            )
            .await
            .unwrap();
        assert_eq!(sent.status, MessageStatus::Sent);

        assert!(storage.get_pending(10).await.unwrap().is_empty());
        assert_eq!(storage.count_by_status(MessageStatus::Sent).await.unwrap(), 1);
        assert_eq!(storage.list_sent(10, 0).await.unwrap(), vec![sent]);

        let latest = storage.latest_for_message(msg.id).await.unwrap().unwrap();
        assert_eq!(latest.external_message_id.as_deref(), Some("ext-9"));

        storage.shutdown().await.unwrap();
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_status_uses_default_impl() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(test_config(&dir));
        storage.initialize().await.unwrap();

        let msg = storage.create("hello", "+1").await.unwrap();
        let failed = storage
            .update_status(msg.id, MessageStatus::Failed)
            .await
            .unwrap();
        assert_eq!(failed.status, MessageStatus::Failed);
        assert!(failed.sent_at.is_none());
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_cascades_through_adapter() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(test_config(&dir));
        storage.initialize().await.unwrap();

        let msg = storage.create("hello", "+1").await.unwrap();
        storage
            .append(&NewDeliveryLog {
                message_id: msg.id,
                external_message_id: None,
                status: DeliveryStatus::Failed,
                response: serde_json::json!({"error": "boom"}),
                sent_at: "2026-01-01T00:00:00.000Z".to_string(),
            })
            .await
            .unwrap();

        assert!(storage.delete(msg.id).await.unwrap());
        assert!(storage.list_for_message(msg.id).await.unwrap().is_empty());
        storage.close().await.unwrap();
    }
}
