// Entry point for the content sync poller

use anyhow::{Context, Result};
use portfolio_sync::application::services::{Poller, SyncCallback, SyncEvent, SyncService};
use portfolio_sync::domain::value_objects::ContentDirectoryPath;
use portfolio_sync::infrastructure::notion::NotionClient;
use portfolio_sync::infrastructure::persistence::JsonDocumentRepository;
use portfolio_sync::Config;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting portfolio content sync");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let client = NotionClient::new(config.notion_client_config())
        .context("Failed to build Notion client")?;
    let directory =
        ContentDirectoryPath::new(config.content_dir.clone()).context("Invalid CONTENT_DIR")?;
    tracing::info!("Writing documents to {}", directory);

    let service = SyncService::new(
        client,
        JsonDocumentRepository::new(directory),
        config.database_query(),
    )
    .with_staleness_window(config.staleness_window);

    let callback: SyncCallback = Arc::new(|event: SyncEvent| match event {
        SyncEvent::DocumentFailed { page_id, error } => {
            tracing::warn!("Page {} will be retried next cycle: {}", page_id, error);
        }
        SyncEvent::CycleFailed { error } => {
            tracing::warn!("Cycle failed, polling continues: {}", error);
        }
        _ => {}
    });

    let handle = Poller::new(service, config.sync_interval)
        .with_cycle_timeout(config.cycle_timeout)
        .with_callback(callback)
        .start()
        .await;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown requested");

    let service = handle.stop().await.context("Poller task failed")?;
    tracing::info!(
        "Stopped with {} known pages",
        service.state().known_page_ids().len()
    );

    Ok(())
}
