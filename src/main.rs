mod bot;
mod config;
mod greet;
mod ops;
mod relay;
mod sanitize;
mod spam;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relaybot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Analyst group: {}", config.telegram.analyst_group_id);
    info!("  Open group: {}", config.telegram.open_group_id);
    info!("  Admin contact: {}", config.moderation.admin_contact);
    info!("  Spam keywords: {}", config.moderation.spam_keywords.len());

    // Run the Telegram bot
    info!("Bot is starting...");
    bot::run(config).await?;

    Ok(())
}
