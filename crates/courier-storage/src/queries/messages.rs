// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.

use courier_core::types::timestamp_now;
use courier_core::{CourierError, Message, MessageStatus, MessageUpdate};
use rusqlite::{OptionalExtension, Row, params};

use super::{parse_column, sql_limit};
use crate::database::Database;

const MESSAGE_COLUMNS: &str =
    "id, content, phone_number, status, external_message_id, sent_at, created_at, updated_at";

fn row_to_message(row: &Row<'_>) -> Result<Message, rusqlite::Error> {
    Ok(Message {
        id: row.get(0)?,
        content: row.get(1)?,
        phone_number: row.get(2)?,
        status: parse_column(3, row.get(3)?)?,
        external_message_id: row.get(4)?,
        sent_at: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn select_by_id(conn: &rusqlite::Connection, id: i64) -> Result<Option<Message>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
        params![id],
        row_to_message,
    )
    .optional()
}

/// Insert a new pending message and return it with its assigned id.
pub async fn create_message(
    db: &Database,
    content: &str,
    phone_number: &str,
) -> Result<Message, CourierError> {
    let content = content.to_string();
    let phone_number = phone_number.to_string();
    let now = timestamp_now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (content, phone_number, status, created_at, updated_at)
                 VALUES (?1, ?2, 'pending', ?3, ?3)",
                params![content, phone_number, now],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                row_to_message,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Up to `limit` pending messages, oldest first. Ties on `created_at` break by id.
pub async fn get_pending(db: &Database, limit: usize) -> Result<Vec<Message>, CourierError> {
    let limit = sql_limit(limit);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE status = 'pending'
                 ORDER BY created_at ASC, id ASC
                 LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All messages in the given status, oldest first.
pub async fn get_by_status(
    db: &Database,
    status: MessageStatus,
) -> Result<Vec<Message>, CourierError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE status = ?1
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![status], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn count_by_status(db: &Database, status: MessageStatus) -> Result<u64, CourierError> {
    let status = status.to_string();
    let count: i64 = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE status = ?1",
                params![status],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(count.max(0) as u64)
}

pub async fn find_by_id(db: &Database, id: i64) -> Result<Option<Message>, CourierError> {
    db.connection()
        .call(move |conn| select_by_id(conn, id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply the set fields of `update` and bump `updated_at`.
///
/// Read and write happen in one transaction so concurrent updates cannot
/// interleave between them.
pub async fn update_message(
    db: &Database,
    id: i64,
    update: &MessageUpdate,
) -> Result<Message, CourierError> {
    let update = update.clone();
    let now = timestamp_now();
    let updated = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(mut message) = select_by_id(&tx, id)? else {
                return Ok(None);
            };

            if let Some(status) = update.status {
                message.status = status;
            }
            if let Some(external_message_id) = update.external_message_id {
                message.external_message_id = external_message_id;
            }
            if let Some(sent_at) = update.sent_at {
                message.sent_at = sent_at;
            }
            message.updated_at = now;

            tx.execute(
                "UPDATE messages
                 SET status = ?1, external_message_id = ?2, sent_at = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    message.status.to_string(),
                    message.external_message_id,
                    message.sent_at,
                    message.updated_at,
                    id,
                ],
            )?;
            tx.commit()?;
            Ok(Some(message))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    updated.ok_or_else(|| CourierError::NotFound {
        entity: "message",
        id: id.to_string(),
    })
}

/// Delete a message. Its delivery logs go with it via `ON DELETE CASCADE`.
pub async fn delete_message(db: &Database, id: i64) -> Result<bool, CourierError> {
    let affected = db
        .connection()
        .call(move |conn| conn.execute("DELETE FROM messages WHERE id = ?1", params![id]))
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(affected > 0)
}

/// Sent messages, most recently sent first.
pub async fn list_sent(
    db: &Database,
    limit: usize,
    offset: usize,
) -> Result<Vec<Message>, CourierError> {
    let limit = sql_limit(limit);
    let offset = sql_limit(offset);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE status = 'sent'
                 ORDER BY sent_at DESC, id DESC
                 LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt.query_map(params![limit, offset], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    /// Pin `created_at` so ordering tests do not depend on clock resolution.
    async fn set_created_at(db: &Database, id: i64, created_at: &str) {
        let created_at = created_at.to_string();
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE messages SET created_at = ?1 WHERE id = ?2",
                    params![created_at, id],
                )
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_assigns_id_and_pending_status() {
        let (db, _dir) = setup_db().await;

        let msg = create_message(&db, "hello", "+905551112233").await.unwrap();
        assert!(msg.id > 0);
        assert_eq!(msg.status, MessageStatus::Pending);
        assert_eq!(msg.content, "hello");
        assert_eq!(msg.phone_number, "+905551112233");
        assert!(msg.external_message_id.is_none());
        assert!(msg.sent_at.is_none());
        assert_eq!(msg.created_at, msg.updated_at);

        let found = find_by_id(&db, msg.id).await.unwrap().unwrap();
        assert_eq!(found, msg);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn schema_rejects_oversized_content() {
        let (db, _dir) = setup_db().await;
        let content = "x".repeat(161);
        let err = create_message(&db, &content, "+1555").await.unwrap_err();
        assert!(matches!(err, CourierError::Storage { .. }));

        let exact = "é".repeat(160);
        assert!(create_message(&db, &exact, "+1555").await.is_ok());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn schema_rejects_empty_phone_number() {
        let (db, _dir) = setup_db().await;
        let err = create_message(&db, "hi", "").await.unwrap_err();
        assert!(matches!(err, CourierError::Storage { .. }));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_pending_orders_oldest_first_and_limits() {
        let (db, _dir) = setup_db().await;

        let a = create_message(&db, "a", "+1").await.unwrap();
        let b = create_message(&db, "b", "+2").await.unwrap();
        let c = create_message(&db, "c", "+3").await.unwrap();
        set_created_at(&db, a.id, "2026-01-01T00:00:03.000Z").await;
        set_created_at(&db, b.id, "2026-01-01T00:00:01.000Z").await;
        set_created_at(&db, c.id, "2026-01-01T00:00:02.000Z").await;

        let pending = get_pending(&db, 2).await.unwrap();
        let ids: Vec<i64> = pending.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![b.id, c.id]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_pending_breaks_ties_by_id() {
        let (db, _dir) = setup_db().await;

        let a = create_message(&db, "a", "+1").await.unwrap();
        let b = create_message(&db, "b", "+2").await.unwrap();
        set_created_at(&db, a.id, "2026-01-01T00:00:00.000Z").await;
        set_created_at(&db, b.id, "2026-01-01T00:00:00.000Z").await;

        let pending = get_pending(&db, 10).await.unwrap();
        assert_eq!(pending[0].id, a.id);
        assert_eq!(pending[1].id, b.id);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_pending_skips_terminal_messages() {
        let (db, _dir) = setup_db().await;

        let a = create_message(&db, "a", "+1").await.unwrap();
        let b = create_message(&db, "b", "+2").await.unwrap();
        update_message(&db, a.id, &MessageUpdate::failed())
            .await
            .unwrap();

        let pending = get_pending(&db, 10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);
        assert!(get_pending(&db, 0).await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_to_sent_sets_fields_and_bumps_updated_at() {
        let (db, _dir) = setup_db().await;
        let msg = create_message(&db, "hi", "+1").await.unwrap();

        let sent_at = "2026-02-01T10:00:00.000Z".to_string();
        let updated = update_message(
            &db,
            msg.id,
            &MessageUpdate::sent(Some("ext-1".to_string()), sent_at.clone()),
        )
        .await
        .unwrap();

        assert_eq!(updated.status, MessageStatus::Sent);
        assert_eq!(updated.external_message_id.as_deref(), Some("ext-1"));
        assert_eq!(updated.sent_at.as_deref(), Some(sent_at.as_str()));
        assert!(updated.updated_at >= msg.updated_at);

        let stored = find_by_id(&db, msg.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_missing_message_is_not_found() {
        let (db, _dir) = setup_db().await;
        let err = update_message(&db, 999, &MessageUpdate::failed())
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::NotFound { entity: "message", .. }));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn count_and_get_by_status() {
        let (db, _dir) = setup_db().await;
        let a = create_message(&db, "a", "+1").await.unwrap();
        create_message(&db, "b", "+2").await.unwrap();
        update_message(&db, a.id, &MessageUpdate::failed())
            .await
            .unwrap();

        assert_eq!(count_by_status(&db, MessageStatus::Pending).await.unwrap(), 1);
        assert_eq!(count_by_status(&db, MessageStatus::Failed).await.unwrap(), 1);
        assert_eq!(count_by_status(&db, MessageStatus::Sent).await.unwrap(), 0);

        let failed = get_by_status(&db, MessageStatus::Failed).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, a.id);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_sent_newest_first_with_offset() {
        let (db, _dir) = setup_db().await;
        let mut ids = Vec::new();
        for i in 1..=3 {
            let msg = create_message(&db, &format!("m{i}"), "+1").await.unwrap();
            update_message(
                &db,
                msg.id,
                &MessageUpdate::sent(None, format!("2026-03-01T00:00:0{i}.000Z")),
            )
            .await
            .unwrap();
            ids.push(msg.id);
        }
        create_message(&db, "still pending", "+1").await.unwrap();

        let page = list_sent(&db, 2, 0).await.unwrap();
        assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), vec![ids[2], ids[1]]);

        let rest = list_sent(&db, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, ids[0]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let (db, _dir) = setup_db().await;
        let msg = create_message(&db, "bye", "+1").await.unwrap();
        assert!(delete_message(&db, msg.id).await.unwrap());
        assert!(!delete_message(&db, msg.id).await.unwrap());
        assert!(find_by_id(&db, msg.id).await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
