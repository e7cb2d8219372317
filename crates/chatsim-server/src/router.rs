//! Axum router construction for one simulated instance.
//!
//! Assembles the API methods and the session endpoint into a single
//! [`Router`] bound to the instance's [`AppState`]. Paths follow the
//! platform's method naming (`/chat.postMessage`), so a client library
//! pointed at [`AppState::api_url`] works unchanged.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::session;
use crate::state::AppState;

/// Build the complete router for one instance.
///
/// The router includes:
/// - `GET /ws` -- session socket
/// - `GET|POST /rtm.start`, `/rtm.connect` -- bootstrap
/// - `POST /chat.postMessage` -- post a message
/// - `GET|POST /channels.list`, `/conversations.list`, `/groups.list`
/// - `GET|POST /users.info`, `/bots.info`, `/conversations.history`
///
/// Anything else answers 404 with `{"ok":false,"error":"unknown_method"}`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Session
        .route("/ws", get(session::ws_session))
        // Bootstrap
        .route("/rtm.start", get(handlers::rtm_start).post(handlers::rtm_start))
        .route("/rtm.connect", get(handlers::rtm_connect).post(handlers::rtm_connect))
        // Messages
        .route("/chat.postMessage", post(handlers::post_message))
        // Read-only listings
        .route("/channels.list", get(handlers::list_channels).post(handlers::list_channels))
        .route(
            "/conversations.list",
            get(handlers::list_channels).post(handlers::list_channels),
        )
        .route("/groups.list", get(handlers::list_groups).post(handlers::list_groups))
        .route("/users.info", get(handlers::users_info).post(handlers::users_info))
        .route("/bots.info", get(handlers::bots_info).post(handlers::bots_info))
        .route(
            "/conversations.history",
            get(handlers::conversations_history).post(handlers::conversations_history),
        )
        .fallback(handlers::unknown_method)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
