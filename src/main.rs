//! Personal Media Catalog Server
//!
//! Loads a flat episode list into a browsable series/season index, exposes
//! it over a JSON API with a static single-page UI, and relays video
//! playback through a same-origin streaming proxy.

#![allow(dead_code)]

mod catalog;
mod config;
mod config_file;
mod error;
mod http;
#[cfg(test)]
mod integration;
mod limits;
mod metrics;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Cli, ServerConfig};
use crate::error::Result;
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "media-catalog-server";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_level.as_deref());

    tracing::info!("{} v{} starting", APP_NAME, VERSION);

    // Load configuration, falling back to defaults if the file is absent
    let mut config = if cli.config.exists() {
        match crate::config_file::ConfigFile::from_file(&cli.config) {
            Ok(cf) => cf.into_server_config(),
            Err(e) => {
                tracing::warn!(
                    "Failed to load config file {}: {}. Using defaults.",
                    cli.config.display(),
                    e
                );
                ServerConfig::default()
            }
        }
    } else {
        ServerConfig::default()
    };
    cli.apply_to(&mut config);
    tracing::info!("Configuration loaded: {:?}", config);

    // One-shot catalog load; the index is immutable from here on
    let index = if config.catalog_path.exists() {
        crate::catalog::load_catalog(&config.catalog_path)?
    } else {
        tracing::warn!(
            "Catalog file {} not found, starting with an empty catalog",
            config.catalog_path.display()
        );
        crate::catalog::CatalogIndex::default()
    };
    tracing::info!("Catalog indexed: {} series", index.len());

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), index)?);

    // Background task: evict expired rate-limit windows every 60 seconds.
    {
        let state_bg = Arc::clone(&state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                state_bg.limiter.cleanup();
            }
        });
    }

    // Build router
    let app = create_router(state.clone());

    // Start server
    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| crate::error::ServerError::Config(format!("Invalid bind address: {}", e)))?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Initialize logging with tracing
fn init_logging(cli_level: Option<&str>) {
    let default_filter = format!(
        "media_catalog_server={},tower_http=info",
        cli_level.unwrap_or("info")
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
