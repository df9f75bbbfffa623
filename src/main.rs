//! Document Insights server.
//!
//! Entry point: loads configuration and serves the web UI and JSON API.

use std::sync::Arc;

use anyhow::Context;
use mimalloc::MiMalloc;

use doc_insights::{config::AppConfig, server, telemetry};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before anything reads the environment
    let _ = dotenvy::dotenv();

    telemetry::init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    server::start_server(Arc::new(config)).await
}
