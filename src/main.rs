//! tabsplit - Telegram bot that splits a shared bill
//!
//! Collects who spent how much through a guided dialogue and replies with
//! the transfers that even everybody out.

mod config;
mod messages;
mod poller;
mod runtime;
mod settlement;
mod state_machine;
mod telegram;

use config::BotConfig;
use runtime::RuntimeManager;
use std::sync::Arc;
use telegram::TelegramClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabsplit=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration, optionally from a .env file
    if let Err(e) = dotenv::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }
    let config = BotConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;
    tracing::info!(config = ?config, "Configuration loaded");

    // Telegram client
    let client = Arc::new(TelegramClient::new(&config)?);
    let me = client.get_me().await.inspect_err(|e| {
        tracing::error!(error = %e, kind = ?e.kind, "Failed to reach the Bot API");
    })?;
    tracing::info!(
        bot_id = me.id,
        name = %me.first_name,
        username = ?me.username,
        "Bot started"
    );

    // Shutdown on Ctrl-C
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
            }
            shutdown.cancel();
        });
    }

    let manager = RuntimeManager::new(
        Arc::clone(&client),
        me.username.clone(),
        config.session_idle,
        shutdown.clone(),
    );

    let result = poller::run_polling(client.as_ref(), &manager, &shutdown).await;
    shutdown.cancel();

    tracing::info!(
        active_sessions = manager.active_sessions().await,
        "Bot stopped"
    );
    result?;
    Ok(())
}
