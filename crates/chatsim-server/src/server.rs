//! Listener lifecycle for one simulated instance.
//!
//! [`bind`] claims the TCP port up front so the instance knows its
//! address (and hub key) before anything is served; [`serve`] then runs
//! the Axum server until the instance's shutdown signal fires.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::config::SimConfig;
use crate::error::ServerError;
use crate::state::wait_for_shutdown;

/// Bind the listener described by `config`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or the port
/// cannot be bound.
pub async fn bind(config: &SimConfig) -> Result<(TcpListener, SocketAddr), ServerError> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    let local = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address for {addr}: {e}")))?;

    Ok((listener, local))
}

/// Serve `router` on `listener` until `shutdown` reads `true`.
///
/// In-flight requests are allowed to finish; open sessions watch the
/// same signal and close themselves.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server hits a fatal I/O error.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Serve(format!("listener has no address: {e}")))?;
    info!(%addr, "chat simulator listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown(shutdown))
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!(%addr, "chat simulator stopped");
    Ok(())
}
