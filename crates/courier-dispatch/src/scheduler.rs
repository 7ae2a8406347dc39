// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic trigger for the dispatch pipeline.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::pipeline::DispatchPipeline;

/// Run `process_batch` repeatedly, pausing `interval` between passes.
///
/// The token is checked between passes only, so a batch in flight always
/// completes. Returns the number of passes run.
pub async fn run_scheduler(
    pipeline: &DispatchPipeline,
    interval: Duration,
    cancel: CancellationToken,
) -> u64 {
    info!(
        interval_ms = interval.as_millis() as u64,
        batch_size = pipeline.batch_size(),
        "dispatch scheduler started"
    );

    let mut passes = 0u64;
    while !cancel.is_cancelled() {
        let summary = pipeline.process_batch().await;
        let purged = pipeline.purge_cache();
        passes += 1;
        debug!(
            pass = passes,
            attempted = summary.attempted,
            purged,
            "dispatch pass complete"
        );

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => {}
        }
    }

    info!(passes, "dispatch scheduler stopped");
    passes
}
