//! Standalone chat simulator.
//!
//! Starts one simulated instance configured from the environment and
//! keeps it running until Ctrl-C, so a bot can be pointed at it by hand.
//! Every frame the bot writes over its session is logged as it arrives.
//!
//! # Environment
//!
//! - `CHATSIM_HOST`, `CHATSIM_PORT` -- listen address (default
//!   `127.0.0.1:0`)
//! - `CHATSIM_BOT_ID`, `CHATSIM_BOT_NAME` -- identity handed to the bot
//! - `RUST_LOG` -- log filter (default `info`)

mod error;

use chatsim_server::{ServerInstance, SimConfig};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::RunnerError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the instance cannot
/// start, or the interrupt handler cannot be installed.
#[tokio::main]
async fn main() -> Result<(), RunnerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("chatsim-runner starting");

    let config = SimConfig::from_env().map_err(|e| RunnerError::Config(e.to_string()))?;
    info!(
        bind = config.bind_address(),
        bot_id = config.bot_id,
        bot_name = config.bot_name,
        "configuration loaded"
    );

    let server = ServerInstance::start(config).await?;
    info!(api_url = server.api_url(), ws_url = server.ws_url(), "point the bot at api_url");

    let mut seen = server.subscribe_seen();
    let watcher = tokio::spawn(async move {
        loop {
            match seen.recv().await {
                Ok(frame) => info!(frame, "bot wrote"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "seen feed lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!(
        seen = server.all_seen().len(),
        delivered = server.all_delivered().len(),
        "interrupt received, stopping"
    );

    server.stop().await;
    watcher.abort();
    Ok(())
}
