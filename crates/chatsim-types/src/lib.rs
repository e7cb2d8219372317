//! Shared wire types for the chatsim platform simulator.
//!
//! Every JSON shape that crosses the simulated HTTP API or the session
//! socket is defined here so the server and its test clients decode the
//! same records.
//!
//! # Modules
//!
//! - [`envelope`] -- Message envelopes, heartbeat probes and the tagged
//!   inbound frame decode
//! - [`fixtures`] -- Channel, group, user, bot and team records plus the
//!   default fixture data every new instance is seeded with

pub mod envelope;
pub mod fixtures;

// Re-export the wire types at crate root for convenience.
pub use envelope::{InboundFrame, JoinedEvent, MessageEnvelope, Ping, Pong, unix_ts};
pub use fixtures::{
    BotIcons, BotInfo, Channel, DEFAULT_BOT_APP_ID, DEFAULT_BOT_ID, DEFAULT_BOT_NAME,
    DEFAULT_DIRECT_CHANNEL_ID, DEFAULT_NON_BOT_USER_ID, DEFAULT_NON_BOT_USER_NAME,
    DEFAULT_TEAM_DOMAIN, DEFAULT_TEAM_ID, DEFAULT_TEAM_NAME, GENERAL_CHANNEL_ID, Group,
    PLAYGROUND_CHANNEL_ID, SECRET_GROUP_ID, SelfInfo, Team, Topic, User, UserProfile,
};
