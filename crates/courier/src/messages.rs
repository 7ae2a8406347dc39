// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier create`, `courier sent` and `courier lookup` command implementations.

use courier_core::CourierError;
use serde::Serialize;

use crate::app::App;

fn print_json<T: Serialize>(value: &T) -> Result<(), CourierError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| CourierError::Internal(format!("failed to render output: {e}")))?;
    println!("{rendered}");
    Ok(())
}

/// Validate and store a new pending message, printing the stored row.
pub async fn run_create(app: &App, phone_number: &str, content: &str) -> Result<(), CourierError> {
    let message = app.service.create_message(content, phone_number).await?;
    print_json(&message)
}

/// Print one page of the sent listing as JSON.
pub async fn run_sent(
    app: &App,
    page: usize,
    per_page: Option<usize>,
) -> Result<(), CourierError> {
    let listing = app.service.list_sent(page, per_page).await?;
    print_json(&listing)
}

/// Print the summary of one sent message as JSON.
///
/// Each invocation starts with an empty result cache, so the answer comes
/// from the message store unless the cache was filled in this process.
pub async fn run_lookup(app: &App, id: i64) -> Result<(), CourierError> {
    let summary = app
        .service
        .lookup_sent(id)
        .await?
        .ok_or_else(|| CourierError::NotFound {
            entity: "sent message",
            id: id.to_string(),
        })?;
    print_json(&summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_config::CourierConfig;

    async fn open_app(dir: &tempfile::TempDir) -> App {
        let mut config = CourierConfig::default();
        config.storage.database_path = dir.path().join("courier.db").display().to_string();
        App::open(&config).await.unwrap()
    }

    #[tokio::test]
    async fn create_rejects_overlong_content() {
        let dir = tempfile::tempdir().unwrap();
        let app = open_app(&dir).await;

        let err = run_create(&app, "+1", &"x".repeat(161)).await.unwrap_err();
        assert!(matches!(err, CourierError::Validation(_)));
        assert_eq!(app.service.status_counts().await.unwrap().pending, 0);
        app.close().await.unwrap();
    }

    #[tokio::test]
    async fn create_then_empty_listing() {
        let dir = tempfile::tempdir().unwrap();
        let app = open_app(&dir).await;

        run_create(&app, " +905551111111 ", "hello").await.unwrap();
        run_sent(&app, 1, None).await.unwrap();

        let page = app.service.list_sent(1, None).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total, 0);
        app.close().await.unwrap();
    }

    #[tokio::test]
    async fn lookup_reports_pending_message_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = open_app(&dir).await;

        let msg = app.service.create_message("hello", "+1").await.unwrap();
        let err = run_lookup(&app, msg.id).await.unwrap_err();
        assert!(matches!(err, CourierError::NotFound { .. }));
        assert!(matches!(
            run_lookup(&app, 999).await,
            Err(CourierError::NotFound { .. })
        ));
        app.close().await.unwrap();
    }

    #[tokio::test]
    async fn lookup_falls_back_to_store_for_sent_message() {
        use courier_core::{MessageStore, MessageUpdate};

        let dir = tempfile::tempdir().unwrap();
        let app = open_app(&dir).await;

        let msg = app.service.create_message("hello", "+1").await.unwrap();
        app.storage
            .update(
                msg.id,
                &MessageUpdate::sent(Some("abc-123".into()), "2026-01-01T00:00:00.000Z".into()),
            )
            .await
            .unwrap();

        run_lookup(&app, msg.id).await.unwrap();
        let summary = app.service.lookup_sent(msg.id).await.unwrap().unwrap();
        assert_eq!(summary.message_id.as_deref(), Some("abc-123"));
        app.close().await.unwrap();
    }
}
