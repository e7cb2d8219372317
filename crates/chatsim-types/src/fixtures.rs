//! Fixture records served by the read-only lookup endpoints.
//!
//! The records mirror the shapes a real workspace returns for its
//! channel, group, user and bot lookups. Every simulated instance is
//! seeded with [`default_channels`] and [`default_groups`]; user and bot
//! lookups always answer with [`non_bot_user`] and [`bot_info`].

use serde::{Deserialize, Serialize};

/// Bot user id presented by a fresh instance.
pub const DEFAULT_BOT_ID: &str = "U023BECGF";

/// Bot display name presented by a fresh instance.
pub const DEFAULT_BOT_NAME: &str = "TestSlackBot";

/// App id attached to the bot record.
pub const DEFAULT_BOT_APP_ID: &str = "A4H1JB4AZ";

/// Team id of the simulated workspace.
pub const DEFAULT_TEAM_ID: &str = "T024BE7LD";

/// Team name of the simulated workspace.
pub const DEFAULT_TEAM_NAME: &str = "SlackTest Team";

/// Team domain of the simulated workspace.
pub const DEFAULT_TEAM_DOMAIN: &str = "testdomain";

/// The human user that authors messages when no user is given.
pub const DEFAULT_NON_BOT_USER_ID: &str = "W012A3CDE";

/// Real name of [`DEFAULT_NON_BOT_USER_ID`].
pub const DEFAULT_NON_BOT_USER_NAME: &str = "Egon Spengler";

/// Direct-message channel between the bot and the default user.
pub const DEFAULT_DIRECT_CHANNEL_ID: &str = "D024BE91L";

/// Id of the `general` channel fixture.
pub const GENERAL_CHANNEL_ID: &str = "C024BE91L";

/// Id of the `bot-playground` channel fixture.
pub const PLAYGROUND_CHANNEL_ID: &str = "C024BE92L";

/// Id of the `secretplans` group fixture.
pub const SECRET_GROUP_ID: &str = "G024BE91L";

const AVATAR_URL: &str =
    "https://localhost.localdomain/avatar/e3b51ca72dee4ef87916ae2b9240df50.jpg";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Topic or purpose line of a channel or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// The text.
    pub value: String,
    /// Who set it.
    pub creator: String,
    /// When it was set, in Unix seconds.
    pub last_set: i64,
}

/// A public channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel id (`C...`).
    pub id: String,
    /// Channel name without the leading `#`.
    pub name: String,
    /// Always `true` for channels.
    pub is_channel: bool,
    /// Creation time in Unix seconds.
    pub created: i64,
    /// User id of the creator.
    pub creator: String,
    /// Whether the channel is archived.
    pub is_archived: bool,
    /// Whether this is the workspace-wide channel.
    pub is_general: bool,
    /// Member user ids.
    pub members: Vec<String>,
    /// Current topic.
    pub topic: Topic,
    /// Current purpose.
    pub purpose: Topic,
    /// Whether the bot is a member.
    pub is_member: bool,
}

/// A private group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group id (`G...`).
    pub id: String,
    /// Group name.
    pub name: String,
    /// Always `true` for groups.
    pub is_group: bool,
    /// Creation time in Unix seconds.
    pub created: i64,
    /// User id of the creator.
    pub creator: String,
    /// Whether the group is archived.
    pub is_archived: bool,
    /// Member user ids.
    pub members: Vec<String>,
    /// Current topic.
    pub topic: Topic,
    /// Current purpose.
    pub purpose: Topic,
}

/// Workspace descriptor returned by the bootstrap endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team id (`T...`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Subdomain.
    pub domain: String,
}

impl Default for Team {
    fn default() -> Self {
        Self {
            id: String::from(DEFAULT_TEAM_ID),
            name: String::from(DEFAULT_TEAM_NAME),
            domain: String::from(DEFAULT_TEAM_DOMAIN),
        }
    }
}

/// The connecting bot's own identity, returned as `self` on bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfInfo {
    /// Bot user id.
    pub id: String,
    /// Bot display name.
    pub name: String,
    /// Account creation time in Unix seconds.
    pub created: i64,
    /// Presence override.
    pub manual_presence: String,
}

/// Profile block of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Avatar cache key.
    pub avatar_hash: String,
    /// Custom status line.
    pub status_text: String,
    /// Custom status emoji.
    pub status_emoji: String,
    /// Full name.
    pub real_name: String,
    /// Display handle.
    pub display_name: String,
    /// Full name with diacritics stripped.
    pub real_name_normalized: String,
    /// Display handle with diacritics stripped.
    pub display_name_normalized: String,
    /// Contact address.
    pub email: String,
    /// 24px avatar URL.
    pub image_24: String,
    /// 32px avatar URL.
    pub image_32: String,
    /// 48px avatar URL.
    pub image_48: String,
    /// 72px avatar URL.
    pub image_72: String,
    /// 192px avatar URL.
    pub image_192: String,
    /// 512px avatar URL.
    pub image_512: String,
    /// Team id.
    pub team: String,
}

/// A workspace member as returned by the user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id.
    pub id: String,
    /// Team the user belongs to.
    pub team_id: String,
    /// Handle.
    pub name: String,
    /// Whether the account is deactivated.
    pub deleted: bool,
    /// Hex colour used by clients.
    pub color: String,
    /// Full name.
    pub real_name: String,
    /// IANA time zone.
    pub tz: String,
    /// Human-readable time zone label.
    pub tz_label: String,
    /// Offset from UTC in seconds.
    pub tz_offset: i64,
    /// Profile details.
    pub profile: UserProfile,
    /// Workspace admin flag.
    pub is_admin: bool,
    /// Workspace owner flag.
    pub is_owner: bool,
    /// Primary owner flag.
    pub is_primary_owner: bool,
    /// Restricted (multi-channel guest) flag.
    pub is_restricted: bool,
    /// Ultra-restricted (single-channel guest) flag.
    pub is_ultra_restricted: bool,
    /// Whether the user is a bot.
    pub is_bot: bool,
    /// Last profile update in Unix seconds.
    pub updated: i64,
    /// Whether the user is an app user.
    pub is_app_user: bool,
    /// Two-factor flag.
    pub has_2fa: bool,
    /// Locale tag.
    pub locale: String,
}

/// Icon set of a [`BotInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIcons {
    /// 36px icon URL.
    pub image_36: String,
    /// 48px avatar URL.
    pub image_48: String,
    /// 72px avatar URL.
    pub image_72: String,
}

/// A bot integration as returned by the bot lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    /// Bot id.
    pub id: String,
    /// Owning app id.
    pub app_id: String,
    /// Whether the bot is removed.
    pub deleted: bool,
    /// Display name.
    pub name: String,
    /// Avatar URLs.
    pub icons: BotIcons,
}

// ---------------------------------------------------------------------------
// Default fixture data
// ---------------------------------------------------------------------------

fn fun_times_topic(now: i64) -> Topic {
    Topic {
        value: String::from("Fun times"),
        creator: String::from(DEFAULT_NON_BOT_USER_ID),
        last_set: now,
    }
}

fn public_channel(id: &str, name: &str, now: i64) -> Channel {
    Channel {
        id: String::from(id),
        name: String::from(name),
        is_channel: true,
        created: now,
        creator: String::from(DEFAULT_NON_BOT_USER_ID),
        is_archived: false,
        is_general: true,
        members: vec![String::from(DEFAULT_NON_BOT_USER_ID)],
        topic: fun_times_topic(now),
        purpose: Topic {
            value: String::from("This channel is for fun"),
            creator: String::from(DEFAULT_NON_BOT_USER_ID),
            last_set: now,
        },
        is_member: true,
    }
}

/// The workspace-wide `general` channel.
pub fn general_channel(now: i64) -> Channel {
    public_channel(GENERAL_CHANNEL_ID, "general", now)
}

/// The `bot-playground` channel, also handed out by channel invites.
pub fn playground_channel(now: i64) -> Channel {
    public_channel(PLAYGROUND_CHANNEL_ID, "bot-playground", now)
}

/// The `secretplans` private group, also handed out by group invites.
pub fn secret_group(now: i64) -> Group {
    Group {
        id: String::from(SECRET_GROUP_ID),
        name: String::from("secretplans"),
        is_group: true,
        created: now,
        creator: String::from(DEFAULT_NON_BOT_USER_ID),
        is_archived: false,
        members: vec![String::from(DEFAULT_NON_BOT_USER_ID)],
        topic: Topic {
            value: String::from("Secret plans on hold"),
            creator: String::from(DEFAULT_NON_BOT_USER_ID),
            last_set: now,
        },
        purpose: Topic {
            value: String::from("Discuss secret plans that no-one else should know"),
            creator: String::from(DEFAULT_NON_BOT_USER_ID),
            last_set: now,
        },
    }
}

/// Channels every new instance starts with, in listing order.
pub fn default_channels(now: i64) -> Vec<Channel> {
    vec![general_channel(now), playground_channel(now)]
}

/// Groups every new instance starts with.
pub fn default_groups(now: i64) -> Vec<Group> {
    vec![secret_group(now)]
}

/// The default human user answered by every user lookup.
pub fn non_bot_user() -> User {
    User {
        id: String::from(DEFAULT_NON_BOT_USER_ID),
        team_id: String::from(DEFAULT_TEAM_ID),
        name: String::from("spengler"),
        deleted: false,
        color: String::from("9f69e7"),
        real_name: String::from(DEFAULT_NON_BOT_USER_NAME),
        tz: String::from("America/Los_Angeles"),
        tz_label: String::from("Pacific Daylight Time"),
        tz_offset: -25200,
        profile: UserProfile {
            avatar_hash: String::from("ge3b51ca72de"),
            status_text: String::from("Print is dead"),
            status_emoji: String::from(":books:"),
            real_name: String::from(DEFAULT_NON_BOT_USER_NAME),
            display_name: String::from("spengler"),
            real_name_normalized: String::from(DEFAULT_NON_BOT_USER_NAME),
            display_name_normalized: String::from("spengler"),
            email: String::from("spengler@ghostbusters.example.com"),
            image_24: String::from(AVATAR_URL),
            image_32: String::from(AVATAR_URL),
            image_48: String::from(AVATAR_URL),
            image_72: String::from(AVATAR_URL),
            image_192: String::from(AVATAR_URL),
            image_512: String::from(AVATAR_URL),
            team: String::from(DEFAULT_TEAM_ID),
        },
        is_admin: true,
        is_owner: false,
        is_primary_owner: false,
        is_restricted: false,
        is_ultra_restricted: false,
        is_bot: false,
        updated: 1_502_138_686,
        is_app_user: false,
        has_2fa: false,
        locale: String::from("en-US"),
    }
}

/// The bot record for the given identity.
pub fn bot_info(bot_id: &str, bot_name: &str) -> BotInfo {
    BotInfo {
        id: String::from(bot_id),
        app_id: String::from(DEFAULT_BOT_APP_ID),
        deleted: false,
        name: String::from(bot_name),
        icons: BotIcons {
            image_36: String::from("https://localhost.localdomain/img36.png"),
            image_48: String::from("https://localhost.localdomain/img48.png"),
            image_72: String::from("https://localhost.localdomain/img72.png"),
        },
    }
}

/// A short channel history that mentions `bot_id`, covering a threaded
/// message, a reacted message, a bot attachment and a direct mention.
pub fn conversation_history(bot_id: &str) -> serde_json::Value {
    serde_json::json!({
        "ok": true,
        "latest": "1522942333",
        "oldest": "1522939726.000713",
        "messages": [
            {
                "type": "message",
                "user": DEFAULT_NON_BOT_USER_ID,
                "text": "this has replies",
                "thread_ts": "1522941680.000626",
                "reply_count": 2,
                "replies": [
                    { "user": DEFAULT_NON_BOT_USER_ID, "ts": "1522941699.000203" },
                    { "user": DEFAULT_NON_BOT_USER_ID, "ts": "1522941709.000423" }
                ],
                "subscribed": false,
                "unread_count": 2,
                "ts": "1522941680.000626"
            },
            {
                "type": "message",
                "user": DEFAULT_NON_BOT_USER_ID,
                "text": "this has reactions",
                "ts": "1522940379.000820",
                "reactions": [
                    { "name": "salute", "users": ["U1234"], "count": 1 }
                ]
            },
            {
                "type": "message",
                "user": bot_id,
                "text": "",
                "bot_id": bot_id,
                "attachments": [
                    {
                        "author_name": "Bob",
                        "fallback": "Bob did a thing",
                        "title": "Foo Created",
                        "id": 1,
                        "color": "ff0000",
                        "fields": [
                            { "title": "ID", "value": "65", "short": true }
                        ]
                    }
                ],
                "ts": "1522939727.000354"
            },
            {
                "type": "message",
                "user": "U1234",
                "text": format!("<@{bot_id}> hey bot"),
                "ts": "1522939726.000713"
            }
        ],
        "has_more": false,
        "pin_count": 0
    })
}
