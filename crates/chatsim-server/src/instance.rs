//! The test author's handle on one simulated server.
//!
//! A [`ServerInstance`] owns a bound listener, a queue set registered in
//! an [`InstanceHub`] under the listener's address, and the background
//! task serving the router. Its methods are the injection and query
//! facade: push events towards the connected client and inspect what the
//! client sent or was sent.
//!
//! ```rust,ignore
//! let server = ServerInstance::start(SimConfig::default()).await?;
//! // point the bot under test at server.api_url()
//! server.inject_to_channel("C1", "hello");
//! assert!(server.was_delivered("hello"));
//! server.stop().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use chatsim_types::fixtures::{playground_channel, secret_group};
use chatsim_types::{
    Channel, DEFAULT_DIRECT_CHANNEL_ID, Group, JoinedEvent, MessageEnvelope,
};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::SimConfig;
use crate::error::ServerError;
use crate::hub::InstanceHub;
use crate::queue::MessageQueueSet;
use crate::router::build_router;
use crate::server;
use crate::state::AppState;

/// How long [`ServerInstance::stop`] waits for the server task to drain.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// One running simulated server.
///
/// Dropping the handle signals shutdown and frees the hub address;
/// [`stop`](Self::stop) does the same and also waits for the listener to
/// close.
#[derive(Debug)]
pub struct ServerInstance {
    state: Arc<AppState>,
    queues: Arc<MessageQueueSet>,
    hub: Arc<InstanceHub>,
    task: Option<JoinHandle<()>>,
}

impl ServerInstance {
    /// Start an instance registered in the process-wide hub.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the listener cannot be bound, or
    /// [`ServerError::Hub`] if the bound address is already registered.
    pub async fn start(config: SimConfig) -> Result<Self, ServerError> {
        Self::start_with_hub(config, InstanceHub::shared()).await
    }

    /// Start an instance registered in `hub`.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start).
    pub async fn start_with_hub(
        config: SimConfig,
        hub: Arc<InstanceHub>,
    ) -> Result<Self, ServerError> {
        let (listener, addr) = server::bind(&config).await?;
        let address = addr.to_string();

        let queues = Arc::new(MessageQueueSet::new());
        hub.register(&address, Some(Arc::clone(&queues)))?;

        let state = Arc::new(AppState::new(address.as_str(), &config, Arc::clone(&hub)));
        let router = build_router(Arc::clone(&state));
        let shutdown = state.shutdown_signal();

        let task = tokio::spawn(async move {
            if let Err(e) = server::serve(listener, router, shutdown).await {
                error!(error = %e, "chat simulator exited with error");
            }
        });

        info!(address = %address, bot = %config.bot_name, "chat simulator started");

        Ok(Self {
            state,
            queues,
            hub,
            task: Some(task),
        })
    }

    /// Signal shutdown, wait for the listener to close, and free the
    /// address in the hub.
    ///
    /// Open sessions are closed and any session blocked on an empty queue
    /// or a socket read is released.
    pub async fn stop(mut self) {
        self.state.request_shutdown();
        self.hub.deregister(self.state.address());

        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(STOP_TIMEOUT, &mut task).await.is_err() {
                warn!(address = self.state.address(), "server did not drain in time, aborting");
                task.abort();
            }
        }
        info!(address = self.state.address(), "chat simulator stopped");
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    /// The `host:port` this instance serves on.
    pub fn address(&self) -> &str {
        self.state.address()
    }

    /// Base URL for the HTTP API, with a trailing slash.
    pub fn api_url(&self) -> String {
        self.state.api_url()
    }

    /// URL of the session endpoint.
    pub fn ws_url(&self) -> String {
        self.state.ws_url()
    }

    /// The bot's user id.
    pub fn bot_id(&self) -> String {
        self.state.identity().id
    }

    /// The bot's display name.
    pub fn bot_name(&self) -> String {
        self.state.identity().name
    }

    /// Rename the bot. Later bootstrap calls report the new name.
    pub fn set_bot_name(&self, name: impl Into<String>) {
        self.state.set_bot_name(name);
    }

    // -----------------------------------------------------------------------
    // Registries
    // -----------------------------------------------------------------------

    /// Snapshot of the channels served by the listing endpoints.
    pub fn channels(&self) -> Vec<Channel> {
        self.state.channels()
    }

    /// Add a channel to the listing.
    pub fn add_channel(&self, channel: Channel) {
        self.state.add_channel(channel);
    }

    /// Snapshot of the groups served by the listing endpoints.
    pub fn groups(&self) -> Vec<Group> {
        self.state.groups()
    }

    /// Add a group to the listing.
    pub fn add_group(&self, group: Group) {
        self.state.add_group(group);
    }

    // -----------------------------------------------------------------------
    // Injection
    // -----------------------------------------------------------------------

    /// Queue a message from the default user in `channel`.
    pub fn inject_to_channel(&self, channel: &str, text: &str) {
        self.inject_raw(&MessageEnvelope::new(channel, text));
    }

    /// Queue a message in `channel` that mentions the bot: `<@BOTID> text`.
    pub fn inject_mention_to_bot(&self, channel: &str, text: &str) {
        let text = format!("<@{}> {text}", self.bot_id());
        self.inject_raw(&MessageEnvelope::new(channel, text));
    }

    /// Queue a direct message to the bot on its direct-message channel.
    pub fn inject_direct_to_bot(&self, text: &str) {
        self.inject_raw(&MessageEnvelope::new(DEFAULT_DIRECT_CHANNEL_ID, text));
    }

    /// Queue a `channel_joined` event for the `bot-playground` channel.
    pub fn inject_channel_invite(&self) {
        let channel = playground_channel(Utc::now().timestamp());
        self.inject_raw(&JoinedEvent::channel_joined(channel));
    }

    /// Queue a `group_joined` event for the `secretplans` group.
    pub fn inject_group_invite(&self) {
        let group = secret_group(Utc::now().timestamp());
        self.inject_raw(&JoinedEvent::group_joined(group));
    }

    /// Queue any serializable event as-is.
    ///
    /// Never blocks. A value that fails to serialize is logged and
    /// dropped.
    pub fn inject_raw<T: Serialize>(&self, event: &T) {
        match serde_json::to_string(event) {
            Ok(json) => self.queues.queue_outbound(json),
            Err(e) => warn!(address = self.address(), error = %e, "unable to serialize injected event"),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Whether the client wrote a message with exactly this text.
    pub fn was_seen(&self, text: &str) -> bool {
        self.queues.saw_inbound(text)
    }

    /// Whether a message with exactly this text was queued for the client,
    /// by injection or through `chat.postMessage`.
    pub fn was_delivered(&self, text: &str) -> bool {
        self.queues.saw_outbound(text)
    }

    /// Every frame the client wrote, heartbeats excluded, in arrival order.
    pub fn all_seen(&self) -> Vec<String> {
        self.queues.seen_inbound()
    }

    /// Every message queued for the client, in delivery order.
    pub fn all_delivered(&self) -> Vec<String> {
        self.queues.seen_outbound()
    }

    /// Number of queued messages no session has taken yet.
    pub fn pending_deliveries(&self) -> usize {
        self.queues.pending_len()
    }

    /// Live feed of every frame recorded from the client from now on.
    pub fn subscribe_seen(&self) -> broadcast::Receiver<String> {
        self.queues.subscribe_seen()
    }
}

impl Drop for ServerInstance {
    fn drop(&mut self) {
        // `stop` already took the task and freed the address.
        if self.task.is_some() {
            self.state.request_shutdown();
            self.hub.deregister(self.state.address());
        }
    }
}
