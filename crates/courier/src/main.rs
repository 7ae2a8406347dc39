// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - rate-limited message dispatch to a webhook endpoint.
//!
//! This is the binary entry point for the Courier service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod messages;
mod send;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use courier_config::CourierConfig;
use courier_core::CourierError;

use crate::app::App;

/// Courier - rate-limited message dispatch to a webhook endpoint.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Load this TOML file instead of the standard config locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Deliver one batch of pending messages.
    Send {
        /// Keep dispatching on the configured interval until interrupted.
        #[arg(long)]
        continuous: bool,
    },
    /// Queue a new message for delivery.
    Create {
        /// Destination phone number.
        #[arg(long)]
        to: String,
        /// Message body (at most 160 characters).
        content: String,
    },
    /// Print sent messages with their delivery logs as JSON.
    Sent {
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Items per page (default 15, max 100).
        #[arg(long)]
        per_page: Option<usize>,
    },
    /// Print the delivery summary of one sent message as JSON.
    Lookup {
        /// Message id.
        id: i64,
    },
    /// Show adapter health and message counts.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => courier_config::load_and_validate_path(path),
        None => courier_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            courier_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &CourierConfig) -> Result<(), CourierError> {
    let app = App::open(config).await?;

    let result = match command {
        Commands::Send { continuous } => {
            send::run_send(&app, continuous, config.dispatch.interval()).await;
            Ok(())
        }
        Commands::Create { to, content } => messages::run_create(&app, &to, &content).await,
        Commands::Sent { page, per_page } => messages::run_sent(&app, page, per_page).await,
        Commands::Lookup { id } => messages::run_lookup(&app, id).await,
        Commands::Status { json } => status::run_status(&app, json).await,
    };

    if let Err(e) = app.close().await {
        tracing::warn!(error = %e, "storage close failed");
    }
    result
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "courier={log_level},courier_dispatch={log_level},courier_storage={log_level},\
             courier_webhook={log_level},courier_cache={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
