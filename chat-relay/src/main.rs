//! anonchat-relay binary entry point.
//!
//! Usage:
//! ```bash
//! anonchat-relay --config anonchat.toml
//! BOT_TOKEN=... SPECTATOR_GROUP_ID=... anonchat-relay
//! ```

use anonchat_relay::config::Config;
use anonchat_relay::dispatch::Dispatcher;
use anonchat_relay::http;
use anonchat_relay::poller;
use anonchat_relay::server::ChatRelay;
use anonchat_relay::transport::TelegramTransport;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Anonymous one-to-one chat relay for Telegram.
#[derive(Parser, Debug)]
#[command(name = "anonchat-relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short, default_value = "anonchat.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("anonchat_relay=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config).context("failed to load configuration")?;
    let sink = config.sink()?;
    tracing::info!(
        "anonchat-relay v{} starting (sink {})",
        env!("CARGO_PKG_VERSION"),
        sink
    );

    let telegram =
        TelegramTransport::new(&config.telegram).context("failed to create Telegram client")?;
    let relay = Arc::new(ChatRelay::new(
        Arc::new(telegram.clone()),
        sink,
        config.surveillance.mirror_messages,
    ));
    let dispatcher = Dispatcher::new(
        relay.clone(),
        Duration::from_secs(config.dispatch.lane_idle_secs),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_task = if config.http.enabled {
        let listener = http::bind(&config.http)
            .await
            .with_context(|| format!("failed to bind {}", config.http.bind_address))?;

        let app = http::build_router(relay.clone());
        let mut shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.wait_for(|stop| *stop).await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!("HTTP server error: {}", e);
            }
        }))
    } else {
        tracing::info!("HTTP endpoints disabled");
        None
    };

    let poller_task = tokio::spawn(poller::run(
        telegram,
        dispatcher.clone(),
        Duration::from_secs(config.telegram.retry_delay_secs),
        shutdown_rx,
    ));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("Shutting down");

    let _ = shutdown_tx.send(true);
    poller_task.await.context("poller task panicked")?;
    dispatcher.close();
    if let Some(task) = http_task {
        task.await.context("HTTP task panicked")?;
    }

    tracing::info!(
        "Stopped with {} users waiting and {} chats open",
        relay.waiting_len().await,
        relay.pair_count().await
    );
    Ok(())
}
