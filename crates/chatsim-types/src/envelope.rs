//! Message envelopes and session frame types.
//!
//! Frames on the session socket are JSON objects discriminated by their
//! `type` field. The server only needs to tell heartbeat probes apart
//! from everything else, so [`InboundFrame::decode`] reads the
//! discriminator first and only then commits to a concrete shape.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::fixtures::DEFAULT_NON_BOT_USER_ID;

/// Discriminator of a chat message event.
pub const MESSAGE_TYPE: &str = "message";

/// Discriminator of a heartbeat probe sent by the client.
pub const PING_TYPE: &str = "ping";

/// Discriminator of a heartbeat acknowledgement sent by the server.
pub const PONG_TYPE: &str = "pong";

/// Discriminator of the event pushed when the bot joins a channel.
pub const CHANNEL_JOINED_TYPE: &str = "channel_joined";

/// Discriminator of the event pushed when the bot joins a private group.
pub const GROUP_JOINED_TYPE: &str = "group_joined";

/// Current Unix time in whole seconds, rendered the way the platform
/// encodes message timestamps.
pub fn unix_ts() -> String {
    Utc::now().timestamp().to_string()
}

/// A chat message as exchanged over the session and the post endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Event discriminator (`"message"` for chat messages).
    #[serde(rename = "type")]
    pub kind: String,
    /// Channel the message belongs to.
    #[serde(default)]
    pub channel: String,
    /// Author of the message.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    /// Message body.
    #[serde(default)]
    pub text: String,
    /// Seconds-resolution timestamp string.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ts: String,
}

impl MessageEnvelope {
    /// Build a message in `channel` authored by the default non-bot user,
    /// stamped with the current time.
    pub fn new(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: String::from(MESSAGE_TYPE),
            channel: channel.into(),
            user: String::from(DEFAULT_NON_BOT_USER_ID),
            text: text.into(),
            ts: unix_ts(),
        }
    }

    /// Replace the author. An empty `user` falls back to the default
    /// non-bot user.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        let user = user.into();
        self.user = if user.is_empty() {
            String::from(DEFAULT_NON_BOT_USER_ID)
        } else {
            user
        };
        self
    }

    /// Replace the timestamp.
    #[must_use]
    pub fn with_ts(mut self, ts: impl Into<String>) -> Self {
        self.ts = ts.into();
        self
    }
}

/// An event that hands the bot a full channel or group record.
///
/// Used for both `channel_joined` and `group_joined`; the platform puts
/// the record under `channel` in either case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedEvent<T> {
    /// Event discriminator.
    #[serde(rename = "type")]
    pub kind: String,
    /// The channel or group that was joined.
    pub channel: T,
}

impl<T> JoinedEvent<T> {
    /// Wrap `channel` in a `channel_joined` event.
    pub fn channel_joined(channel: T) -> Self {
        Self {
            kind: String::from(CHANNEL_JOINED_TYPE),
            channel,
        }
    }

    /// Wrap `group` in a `group_joined` event.
    pub fn group_joined(group: T) -> Self {
        Self {
            kind: String::from(GROUP_JOINED_TYPE),
            channel: group,
        }
    }
}

/// Heartbeat probe written by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    /// Correlation id echoed back in the matching [`Pong`].
    #[serde(default)]
    pub id: u64,
}

/// Heartbeat acknowledgement written by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pong {
    /// Always `"pong"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Correlation id of the probe being answered.
    pub reply_to: u64,
}

impl Pong {
    /// Acknowledge `ping`.
    pub fn answering(ping: Ping) -> Self {
        Self {
            kind: String::from(PONG_TYPE),
            reply_to: ping.id,
        }
    }
}

/// Discriminator-only view of a frame, read before committing to a shape.
#[derive(Debug, Deserialize)]
struct FrameHeader {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// A frame written by the client over its session, classified by `type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Heartbeat probe. Answered immediately, never recorded.
    Ping(Ping),
    /// Any other well-formed frame. `kind` is the discriminator, empty
    /// when the frame carried none.
    Event {
        /// The frame's `type` field.
        kind: String,
    },
}

impl InboundFrame {
    /// Classify a text frame.
    ///
    /// Unknown discriminators are not an error: they decode as
    /// [`InboundFrame::Event`] and are left to the caller.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] when `text` is not a
    /// JSON object, its `type` field is not a string, or a ping carries an
    /// id that is not an unsigned integer.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        let header: FrameHeader = serde_json::from_str(text)?;
        match header.kind {
            Some(kind) if kind == PING_TYPE => Ok(Self::Ping(serde_json::from_str(text)?)),
            kind => Ok(Self::Event {
                kind: kind.unwrap_or_default(),
            }),
        }
    }
}
