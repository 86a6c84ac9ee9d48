//! Reach report bot
//!
//! Walks an operator through a fixed series of prompts over Telegram,
//! then publishes a formatted campaign reach report back to the chat.

mod config;
mod links;
mod report;
mod runtime;
mod state_machine;
mod telegram;

use config::BotConfig;
use runtime::{PassthroughEnricher, RuntimeManager};
use std::sync::Arc;
use std::time::Duration;
use telegram::{Poller, TelegramClient};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long in-flight conversations may take to finish after Ctrl-C
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before logging so it can carry RUST_LOG
    let dotenv_path =
        std::env::var("REPORT_BOT_DOTENV_PATH").unwrap_or_else(|_| ".env".to_string());
    let dotenv_result = dotenvy::from_path(&dotenv_path);

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reach_report_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    match dotenv_result {
        Ok(()) => tracing::info!(path = %dotenv_path, "Loaded env file"),
        Err(e) => tracing::debug!(path = %dotenv_path, error = %e, "No env file loaded"),
    }

    let config = BotConfig::from_env()?;
    let guard = config.allow_list();
    if guard.is_unrestricted() {
        tracing::warn!("ADMIN_IDS is empty; anyone may create reports");
    }
    let settings = config.runtime_settings();
    tracing::info!(
        max_message_len = settings.max_message_len,
        max_media_batch = settings.max_media_batch,
        enrich_timeout = ?settings.enrich_timeout,
        idle_timeout = ?settings.idle_timeout,
        "Configuration loaded"
    );

    let client = TelegramClient::new(
        &config.telegram_api_url,
        &config.bot_token,
        config.poll_timeout(),
    )?;
    let manager = RuntimeManager::new(
        Arc::new(client.clone()),
        Arc::new(PassthroughEnricher),
        guard,
        settings,
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested");
                on_signal.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    Poller::new(client, config.poll_timeout())
        .run(&manager, cancel)
        .await;

    let drained = manager.shutdown(SHUTDOWN_GRACE).await;
    tracing::info!(drained, "Reach report bot stopped");
    Ok(())
}
