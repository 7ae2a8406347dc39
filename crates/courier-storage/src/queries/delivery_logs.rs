// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only delivery log operations.

use courier_core::types::timestamp_now;
use courier_core::{CourierError, DeliveryLogEntry, NewDeliveryLog};
use rusqlite::{Row, params, params_from_iter};

use super::parse_column;
use crate::database::Database;

const LOG_COLUMNS: &str =
    "id, message_id, external_message_id, status, response, sent_at, created_at";

fn row_to_entry(row: &Row<'_>) -> Result<DeliveryLogEntry, rusqlite::Error> {
    let raw_response: String = row.get(4)?;
    let response = serde_json::from_str(&raw_response).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(DeliveryLogEntry {
        id: row.get(0)?,
        message_id: row.get(1)?,
        external_message_id: row.get(2)?,
        status: parse_column(3, row.get(3)?)?,
        response,
        sent_at: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Append one entry. Fails if the referenced message does not exist.
pub async fn append_log(
    db: &Database,
    entry: &NewDeliveryLog,
) -> Result<DeliveryLogEntry, CourierError> {
    let response = serde_json::to_string(&entry.response).map_err(CourierError::storage)?;
    let message_id = entry.message_id;
    let external_message_id = entry.external_message_id.clone();
    let status = entry.status.to_string();
    let sent_at = entry.sent_at.clone();
    let created_at = timestamp_now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO delivery_logs
                 (message_id, external_message_id, status, response, sent_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![message_id, external_message_id, status, response, sent_at, created_at],
            )?;
            conn.query_row(
                &format!("SELECT {LOG_COLUMNS} FROM delivery_logs WHERE id = ?1"),
                params![conn.last_insert_rowid()],
                row_to_entry,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All entries for a message, newest `sent_at` first.
pub async fn list_for_message(
    db: &Database,
    message_id: i64,
) -> Result<Vec<DeliveryLogEntry>, CourierError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LOG_COLUMNS} FROM delivery_logs
                 WHERE message_id = ?1
                 ORDER BY sent_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![message_id], row_to_entry)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Entries for several messages in one query, grouped by message id and newest first within each.
pub async fn list_for_messages(
    db: &Database,
    message_ids: &[i64],
) -> Result<Vec<DeliveryLogEntry>, CourierError> {
    if message_ids.is_empty() {
        return Ok(Vec::new());
    }

    let ids = message_ids.to_vec();
    db.connection()
        .call(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT {LOG_COLUMNS} FROM delivery_logs
                 WHERE message_id IN ({placeholders})
                 ORDER BY message_id ASC, sent_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params_from_iter(ids.iter()), row_to_entry)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::messages::{create_message, delete_message};
    use courier_core::DeliveryStatus;
    use serde_json::json;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn new_log(message_id: i64, status: DeliveryStatus, sent_at: &str) -> NewDeliveryLog {
        NewDeliveryLog {
            message_id,
            external_message_id: None,
            status,
            response: json!({"message": "Accepted"}),
            sent_at: sent_at.to_string(),
        }
    }

    #[tokio::test]
    async fn append_round_trips_response_json() {
        let (db, _dir) = setup_db().await;
        let msg = create_message(&db, "hi", "+1").await.unwrap();

        let mut entry = new_log(msg.id, DeliveryStatus::Sent, "2026-01-01T00:00:00.000Z");
        entry.external_message_id = Some("abc".to_string());
        entry.response = json!({"messageId": "abc", "nested": {"ok": true}});

        let stored = append_log(&db, &entry).await.unwrap();
        assert!(stored.id > 0);

        let logs = list_for_message(&db, msg.id).await.unwrap();
        assert_eq!(logs, vec![stored]);
        assert_eq!(logs[0].response["nested"]["ok"], json!(true));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn append_for_missing_message_fails() {
        let (db, _dir) = setup_db().await;
        let entry = new_log(42, DeliveryStatus::Failed, "2026-01-01T00:00:00.000Z");
        let err = append_log(&db, &entry).await.unwrap_err();
        assert!(matches!(err, CourierError::Storage { .. }));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_for_message_newest_first() {
        let (db, _dir) = setup_db().await;
        let msg = create_message(&db, "hi", "+1").await.unwrap();

        append_log(&db, &new_log(msg.id, DeliveryStatus::Failed, "2026-01-01T00:00:01.000Z"))
            .await
            .unwrap();
        append_log(&db, &new_log(msg.id, DeliveryStatus::Sent, "2026-01-01T00:00:02.000Z"))
            .await
            .unwrap();

        let logs = list_for_message(&db, msg.id).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].status, DeliveryStatus::Sent);
        assert_eq!(logs[1].status, DeliveryStatus::Failed);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_for_messages_groups_by_message() {
        let (db, _dir) = setup_db().await;
        let a = create_message(&db, "a", "+1").await.unwrap();
        let b = create_message(&db, "b", "+2").await.unwrap();
        let c = create_message(&db, "c", "+3").await.unwrap();

        for (id, sent_at) in [
            (b.id, "2026-01-01T00:00:01.000Z"),
            (a.id, "2026-01-01T00:00:02.000Z"),
            (a.id, "2026-01-01T00:00:03.000Z"),
            (c.id, "2026-01-01T00:00:04.000Z"),
        ] {
            append_log(&db, &new_log(id, DeliveryStatus::Sent, sent_at))
                .await
                .unwrap();
        }

        let logs = list_for_messages(&db, &[a.id, b.id]).await.unwrap();
        let pairs: Vec<(i64, &str)> = logs
            .iter()
            .map(|l| (l.message_id, l.sent_at.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (a.id, "2026-01-01T00:00:03.000Z"),
                (a.id, "2026-01-01T00:00:02.000Z"),
                (b.id, "2026-01-01T00:00:01.000Z"),
            ]
        );
        assert!(list_for_messages(&db, &[]).await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn deleting_message_cascades_to_logs() {
        let (db, _dir) = setup_db().await;
        let msg = create_message(&db, "hi", "+1").await.unwrap();
        append_log(&db, &new_log(msg.id, DeliveryStatus::Sent, "2026-01-01T00:00:00.000Z"))
            .await
            .unwrap();

        assert!(delete_message(&db, msg.id).await.unwrap());
        assert!(list_for_message(&db, msg.id).await.unwrap().is_empty());
        db.close().await.unwrap();
    }
}
