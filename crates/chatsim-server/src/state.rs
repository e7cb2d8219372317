//! Shared per-instance context for the Axum application.
//!
//! [`AppState`] is what every handler of one instance receives. It
//! carries the instance's address (the key into the
//! [`InstanceHub`]), the hub itself, the bot identity presented on
//! bootstrap, the channel and group registries, and the shutdown signal
//! that open sessions watch.
//!
//! The queue set is deliberately not stored here: handlers resolve it
//! through the hub on every request, so a deregistered instance stops
//! accepting traffic immediately.

use std::sync::{Arc, RwLock};

use chatsim_types::fixtures::{default_channels, default_groups};
use chatsim_types::{Channel, Group, Team};
use chrono::Utc;
use tokio::sync::watch;

use crate::config::SimConfig;
use crate::error::HubError;
use crate::hub::InstanceHub;
use crate::queue::{MessageQueueSet, read_lock, write_lock};

/// Bot identity, mutable while the instance runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    /// Bot user id.
    pub id: String,
    /// Bot display name.
    pub name: String,
}

/// Shared state for the Axum application of one instance.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug)]
pub struct AppState {
    /// The `host:port` this instance serves on; its key in the hub.
    address: String,
    /// Registry the handlers resolve their queue set through.
    hub: Arc<InstanceHub>,
    /// Identity returned by the bootstrap and bot lookup endpoints.
    identity: RwLock<BotIdentity>,
    /// Workspace descriptor.
    team: Team,
    /// Unix time the instance was created; stamps the bot's `created`.
    created: i64,
    /// Channel registry, append-only.
    channels: RwLock<Vec<Channel>>,
    /// Group registry, append-only.
    groups: RwLock<Vec<Group>>,
    /// Flips to `true` once when the instance is stopping.
    shutdown: watch::Sender<bool>,
}

impl AppState {
    /// Create the context for the instance at `address`, seeding the
    /// registries with the default fixtures.
    pub fn new(address: impl Into<String>, config: &SimConfig, hub: Arc<InstanceHub>) -> Self {
        let now = Utc::now().timestamp();
        let (shutdown, _) = watch::channel(false);
        Self {
            address: address.into(),
            hub,
            identity: RwLock::new(BotIdentity {
                id: config.bot_id.clone(),
                name: config.bot_name.clone(),
            }),
            team: config.team.clone(),
            created: now,
            channels: RwLock::new(default_channels(now)),
            groups: RwLock::new(default_groups(now)),
            shutdown,
        }
    }

    /// The instance address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Resolve this instance's queue set through the hub.
    ///
    /// # Errors
    ///
    /// Returns the hub's error if the address is empty or no longer
    /// registered.
    pub fn queues(&self) -> Result<Arc<MessageQueueSet>, HubError> {
        self.hub.lookup(&self.address)
    }

    /// Base URL of the HTTP API, with a trailing slash.
    pub fn api_url(&self) -> String {
        format!("http://{}/", self.address)
    }

    /// URL of the session endpoint.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.address)
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    /// Current bot identity.
    pub fn identity(&self) -> BotIdentity {
        read_lock(&self.identity).clone()
    }

    /// Rename the bot. Later bootstrap calls report the new name.
    pub fn set_bot_name(&self, name: impl Into<String>) {
        write_lock(&self.identity).name = name.into();
    }

    /// The workspace descriptor.
    pub const fn team(&self) -> &Team {
        &self.team
    }

    /// Unix time the instance was created.
    pub const fn created(&self) -> i64 {
        self.created
    }

    // -----------------------------------------------------------------------
    // Registries
    // -----------------------------------------------------------------------

    /// Snapshot of the channel registry.
    pub fn channels(&self) -> Vec<Channel> {
        read_lock(&self.channels).clone()
    }

    /// Append a channel to the registry.
    pub fn add_channel(&self, channel: Channel) {
        write_lock(&self.channels).push(channel);
    }

    /// Snapshot of the group registry.
    pub fn groups(&self) -> Vec<Group> {
        read_lock(&self.groups).clone()
    }

    /// Append a group to the registry.
    pub fn add_group(&self, group: Group) {
        write_lock(&self.groups).push(group);
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    /// A receiver that observes the shutdown flag.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Tell every open session and the listener to stop.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

/// Resolve once `signal` reads `true`, or once its sender is gone.
pub async fn wait_for_shutdown(mut signal: watch::Receiver<bool>) {
    let _ = signal.wait_for(|stopping| *stopping).await;
}
