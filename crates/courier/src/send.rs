// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier send` command implementation.

use std::time::Duration;

use courier_dispatch::{BatchSummary, install_signal_handler, run_scheduler};
use tracing::info;

use crate::app::App;

/// Run one dispatch pass, or keep dispatching until SIGINT/SIGTERM.
pub async fn run_send(app: &App, continuous: bool, interval: Duration) {
    if continuous {
        let cancel = install_signal_handler();
        let passes = run_scheduler(&app.pipeline, interval, cancel).await;
        info!(passes, "continuous dispatch finished");
        return;
    }

    let BatchSummary {
        attempted,
        sent,
        failed,
    } = app.pipeline.process_batch().await;
    println!("attempted={attempted} sent={sent} failed={failed}");
}
