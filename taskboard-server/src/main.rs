//! Taskboard Server -- authoritative real-time task board.
//!
//! An axum WebSocket server that holds the shared task collection, applies
//! client intents against it, and broadcasts the resulting facts to every
//! connected observer. Task state is ephemeral; only uploaded attachments
//! touch disk.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:5000
//! cargo run --bin taskboard-server
//!
//! # Run on custom address
//! cargo run --bin taskboard-server -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! TASKBOARD_ADDR=127.0.0.1:8080 cargo run --bin taskboard-server
//! ```

use std::sync::Arc;

use clap::Parser;
use taskboard_server::board::{self, BoardState};
use taskboard_server::config::{BoardCliArgs, BoardConfig};
use taskboard_server::uploads::AttachmentStore;

#[tokio::main]
async fn main() {
    let cli = BoardCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match BoardConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting taskboard server");

    // The blob area must exist before the static file service can serve it.
    if let Err(e) = tokio::fs::create_dir_all(&config.uploads_dir).await {
        tracing::error!(dir = %config.uploads_dir.display(), error = %e, "failed to create uploads directory");
        std::process::exit(1);
    }

    let uploads = AttachmentStore::with_max_size(&config.uploads_dir, config.max_upload_size);
    let state = Arc::new(BoardState::with_uploads(uploads));

    match board::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "taskboard server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "board server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start board server");
            std::process::exit(1);
        }
    }
}
