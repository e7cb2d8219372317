//! HTTP API endpoint handlers.
//!
//! Every handler receives the instance's [`AppState`]. Handlers that
//! touch message queues resolve them through the hub first, so a request
//! against an unregistered instance fails on its own without affecting
//! any other instance.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`/`POST` | `/rtm.start` | Bootstrap: identity, team, session URL, registries |
//! | `GET`/`POST` | `/rtm.connect` | Bootstrap: identity, team, session URL |
//! | `POST` | `/chat.postMessage` | Post a message (form body) |
//! | `GET`/`POST` | `/channels.list` | List channels |
//! | `GET`/`POST` | `/conversations.list` | List channels |
//! | `GET`/`POST` | `/groups.list` | List private groups |
//! | `GET`/`POST` | `/users.info` | Look up a user (`?user=`) |
//! | `GET`/`POST` | `/bots.info` | Look up a bot (`?bot=`) |
//! | `GET`/`POST` | `/conversations.history` | Fixed channel history |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chatsim_types::fixtures::{bot_info, conversation_history, non_bot_user};
use chatsim_types::{Channel, Group, MessageEnvelope, SelfInfo, Team, unix_ts};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::SimError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Form body of `POST /chat.postMessage`.
///
/// Unknown fields (tokens, attachments, ...) are ignored.
#[derive(Debug, Deserialize)]
pub struct PostMessageForm {
    /// Target channel.
    pub channel: String,
    /// Message body.
    #[serde(default)]
    pub text: String,
    /// Author; the default non-bot user when absent or empty.
    #[serde(default)]
    pub user: Option<String>,
}

/// Acknowledgement returned by `POST /chat.postMessage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMessageAck {
    /// Always `true`.
    pub ok: bool,
    /// Channel the message was posted to.
    pub channel: String,
    /// Timestamp assigned to the message.
    pub ts: String,
    /// Posted text.
    pub text: String,
}

/// Response of the bootstrap endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectInfo {
    /// Always `true`.
    pub ok: bool,
    /// Session endpoint the client should connect to.
    pub url: String,
    /// Workspace descriptor.
    pub team: Team,
    /// The bot's own identity.
    #[serde(rename = "self")]
    pub self_info: SelfInfo,
    /// Channel registry; only returned by `rtm.start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<Channel>>,
    /// Group registry; only returned by `rtm.start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
}

/// Query of `users.info`.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    /// Requested user id. Every lookup answers with the default user.
    pub user: Option<String>,
}

/// Query of `bots.info`.
#[derive(Debug, Deserialize)]
pub struct BotQuery {
    /// Requested bot id. Every lookup answers with the instance's bot.
    pub bot: Option<String>,
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn connect_info(state: &AppState, with_registries: bool) -> Result<ConnectInfo, SimError> {
    // Refuse to hand out a session URL for an instance the hub no longer knows.
    state.queues()?;

    let identity = state.identity();
    Ok(ConnectInfo {
        ok: true,
        url: state.ws_url(),
        team: state.team().clone(),
        self_info: SelfInfo {
            id: identity.id,
            name: identity.name,
            created: state.created(),
            manual_presence: String::from("true"),
        },
        channels: with_registries.then(|| state.channels()),
        groups: with_registries.then(|| state.groups()),
    })
}

/// Full bootstrap: identity, team, session URL and the registries.
pub async fn rtm_start(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConnectInfo>, SimError> {
    let info = connect_info(&state, true)?;
    debug!(address = state.address(), bot = %info.self_info.name, "rtm.start");
    Ok(Json(info))
}

/// Light bootstrap: identity, team and session URL.
pub async fn rtm_connect(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConnectInfo>, SimError> {
    let info = connect_info(&state, false)?;
    debug!(address = state.address(), bot = %info.self_info.name, "rtm.connect");
    Ok(Json(info))
}

// ---------------------------------------------------------------------------
// POST /chat.postMessage
// ---------------------------------------------------------------------------

/// Record a posted message and mirror it onto the session queue so a
/// connected client sees it as an event.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    form: Result<Form<PostMessageForm>, FormRejection>,
) -> Result<Json<PostMessageAck>, SimError> {
    let Form(form) = form.map_err(|e| {
        warn!(address = state.address(), error = %e, "unable to decode posted message");
        SimError::InvalidForm(e.body_text())
    })?;
    let queues = state.queues()?;

    let ts = unix_ts();
    let message = MessageEnvelope::new(form.channel.as_str(), form.text.as_str())
        .with_user(form.user.unwrap_or_default())
        .with_ts(ts.as_str());
    let json = serde_json::to_string(&message).inspect_err(|e| {
        warn!(error = %e, "unable to serialize posted message");
    })?;

    info!(address = state.address(), channel = %form.channel, "message posted");
    queues.queue_outbound(json);

    Ok(Json(PostMessageAck {
        ok: true,
        channel: form.channel,
        ts,
        text: form.text,
    }))
}

// ---------------------------------------------------------------------------
// Read-only listings
// ---------------------------------------------------------------------------

/// List the instance's channels.
pub async fn list_channels(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "channels": state.channels(),
    }))
}

/// List the instance's private groups.
pub async fn list_groups(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "groups": state.groups(),
    }))
}

/// Look up a user. Always answers with the default human user.
pub async fn users_info(Query(query): Query<UserQuery>) -> impl IntoResponse {
    debug!(requested = ?query.user, "users.info");
    Json(serde_json::json!({
        "ok": true,
        "user": non_bot_user(),
    }))
}

/// Look up a bot. Always answers with the instance's current identity.
pub async fn bots_info(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BotQuery>,
) -> impl IntoResponse {
    debug!(requested = ?query.bot, "bots.info");
    let identity = state.identity();
    Json(serde_json::json!({
        "ok": true,
        "bot": bot_info(&identity.id, &identity.name),
    }))
}

/// A fixed channel history mentioning the instance's bot.
pub async fn conversations_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(conversation_history(&state.identity().id))
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Answer API methods the simulator does not implement.
pub async fn unknown_method() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "ok": false,
            "error": "unknown_method",
        })),
    )
}
