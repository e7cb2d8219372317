//! Session socket handler.
//!
//! Clients connect to `GET /ws` after bootstrapping through `rtm.start`
//! or `rtm.connect`. Each open session runs two duties over the one
//! socket:
//!
//! - **delivery**: take the next message from the instance's outbound
//!   queue and push it as a text frame
//! - **ingestion**: read client frames; answer heartbeat probes at once
//!   and record everything else in inbound history
//!
//! Both duties live in one `select!` loop so writes never interleave.
//! Every branch future is cancel-safe, so a message is never lost when
//! the other branch wins. The loop ends on a close frame, a transport
//! error, or the instance's shutdown signal.

use std::ops::ControlFlow;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chatsim_types::{InboundFrame, Pong};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::SimError;
use crate::queue::MessageQueueSet;
use crate::state::{AppState, wait_for_shutdown};

/// Upgrade an HTTP request to a session.
///
/// The instance's queue set is resolved before upgrading; if the hub
/// lookup fails the upgrade is refused with a 500.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_session(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, SimError> {
    let queues = state.queues().inspect_err(|e| {
        warn!(address = state.address(), error = %e, "refusing session upgrade");
    })?;
    let shutdown = state.shutdown_signal();
    let address = state.address().to_owned();

    Ok(ws
        .on_failed_upgrade(|e| warn!(error = %e, "session upgrade failed"))
        .on_upgrade(move |socket| run_session(socket, queues, shutdown, address)))
}

/// Drive one open session until it closes.
async fn run_session(
    mut socket: WebSocket,
    queues: Arc<MessageQueueSet>,
    shutdown: watch::Receiver<bool>,
    address: String,
) {
    debug!(address = %address, "session opened");

    loop {
        tokio::select! {
            () = wait_for_shutdown(shutdown.clone()) => {
                debug!(address = %address, "instance stopping, closing session");
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            outbound = queues.next_outbound() => {
                if deliver(&mut socket, &queues, outbound).await.is_break() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if ingest(&mut socket, &queues, text.as_str()).await.is_break() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(address = %address, "session closed by client");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(address = %address, error = %e, "session read failed");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary frames carry nothing we understand; transport
                        // pings are answered by the socket layer.
                    }
                }
            }
        }
    }

    debug!(address = %address, "session ended");
}

/// Push one queued message to the client.
///
/// On a failed write the message goes back to the head of the queue so
/// the next session picks it up in order.
async fn deliver(
    socket: &mut WebSocket,
    queues: &MessageQueueSet,
    message: String,
) -> ControlFlow<()> {
    match socket.send(Message::Text(message.clone().into())).await {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => {
            debug!(error = %e, "session write failed, requeueing message");
            queues.requeue_front(message);
            ControlFlow::Break(())
        }
    }
}

/// Classify one client text frame.
async fn ingest(socket: &mut WebSocket, queues: &MessageQueueSet, text: &str) -> ControlFlow<()> {
    match InboundFrame::decode(text) {
        Ok(InboundFrame::Ping(ping)) => {
            let pong = match serde_json::to_string(&Pong::answering(ping)) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to serialize pong");
                    return ControlFlow::Continue(());
                }
            };
            if socket.send(Message::Text(pong.into())).await.is_err() {
                debug!("session write failed while answering ping");
                return ControlFlow::Break(());
            }
        }
        Ok(InboundFrame::Event { kind }) => {
            debug!(kind = %kind, "recording inbound frame");
            queues.record_inbound(text.to_owned());
        }
        Err(e) => {
            warn!(error = %e, frame = text, "dropping malformed session frame");
        }
    }
    ControlFlow::Continue(())
}
