// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier status` command implementation.
//!
//! Runs every adapter health check and reports message counts per status.

use courier_core::{CacheStats, CourierError, HealthStatus, PluginAdapter, ResultCache};
use courier_dispatch::StatusCounts;
use serde::Serialize;

use crate::app::App;

/// One adapter's health, flattened for display.
#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub kind: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub adapters: Vec<AdapterHealth>,
    pub messages: StatusCounts,
    /// Stats of the in-memory cache owned by this process. A `courier status`
    /// run starts with an empty cache, so the count only reflects entries
    /// written by this invocation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
    /// Always `"process"`: the cache is not shared between invocations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_scope: Option<&'static str>,
}

async fn check_health(adapter: &dyn PluginAdapter) -> AdapterHealth {
    let (status, detail) = match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => ("healthy", None),
        Ok(HealthStatus::Degraded(reason)) => ("degraded", Some(reason)),
        Ok(HealthStatus::Unhealthy(reason)) => ("unhealthy", Some(reason)),
        Err(e) => ("unhealthy", Some(e.to_string())),
    };
    AdapterHealth {
        name: adapter.name().to_string(),
        kind: adapter.adapter_type().to_string(),
        status: status.to_string(),
        detail,
    }
}

/// Gather health and counts without printing.
pub async fn collect_status(app: &App) -> Result<StatusResponse, CourierError> {
    let mut adapters = vec![
        check_health(app.storage.as_ref()).await,
        check_health(app.webhook.as_ref()).await,
    ];
    let cache = match &app.cache {
        Some(cache) => {
            adapters.push(check_health(cache.as_ref()).await);
            Some(cache.stats()?)
        }
        None => None,
    };

    Ok(StatusResponse {
        adapters,
        messages: app.service.status_counts().await?,
        cache_scope: cache.as_ref().map(|_| "process"),
        cache,
    })
}

/// Run the `courier status` command.
pub async fn run_status(app: &App, json: bool) -> Result<(), CourierError> {
    let status = collect_status(app).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&status)
            .map_err(|e| CourierError::Internal(format!("failed to render status: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    for adapter in &status.adapters {
        match &adapter.detail {
            Some(detail) => println!(
                "  {:<14} {:<8} {} ({detail})",
                adapter.name, adapter.kind, adapter.status
            ),
            None => println!("  {:<14} {:<8} {}", adapter.name, adapter.kind, adapter.status),
        }
    }
    let counts = status.messages;
    println!(
        "  messages       pending={} sent={} failed={}",
        counts.pending, counts.sent, counts.failed
    );
    if let Some(cache) = &status.cache {
        println!(
            "  cache          {} entries held by this process (ttl {}s, not shared across runs)",
            cache.count, cache.ttl_secs
        );
    }
    Ok(())
}
