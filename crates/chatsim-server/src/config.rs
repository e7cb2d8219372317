//! Constructor options for a simulated instance.
//!
//! [`SimConfig::default`] gives a fresh instance on an ephemeral loopback
//! port presenting the default bot identity. The standalone runner loads
//! overrides from the environment with [`SimConfig::from_env`]; tests
//! usually start from the default and chain the `with_*` setters.

use chatsim_types::{DEFAULT_BOT_ID, DEFAULT_BOT_NAME, Team};

use crate::error::ServerError;

/// Options for one simulated instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Host address to bind to.
    pub host: String,
    /// TCP port to listen on. `0` picks a free port.
    pub port: u16,
    /// User id the bot is told it has.
    pub bot_id: String,
    /// Display name the bot is told it has.
    pub bot_name: String,
    /// Workspace descriptor returned on bootstrap.
    pub team: Team,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 0,
            bot_id: String::from(DEFAULT_BOT_ID),
            bot_name: String::from(DEFAULT_BOT_NAME),
            team: Team::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from environment variables, falling back to
    /// [`SimConfig::default`] for anything unset.
    ///
    /// Optional variables:
    /// - `CHATSIM_HOST` -- bind address (default `127.0.0.1`)
    /// - `CHATSIM_PORT` -- listen port (default `0`, ephemeral)
    /// - `CHATSIM_BOT_ID` -- bot user id (default `U023BECGF`)
    /// - `CHATSIM_BOT_NAME` -- bot display name (default `TestSlackBot`)
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if `CHATSIM_PORT` is not a valid
    /// port number.
    pub fn from_env() -> Result<Self, ServerError> {
        let defaults = Self::default();

        let port: u16 = match std::env::var("CHATSIM_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| ServerError::Config(format!("invalid CHATSIM_PORT {raw:?}: {e}")))?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            host: std::env::var("CHATSIM_HOST").unwrap_or(defaults.host),
            port,
            bot_id: std::env::var("CHATSIM_BOT_ID").unwrap_or(defaults.bot_id),
            bot_name: std::env::var("CHATSIM_BOT_NAME").unwrap_or(defaults.bot_name),
            team: defaults.team,
        })
    }

    /// Set the listen port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the bot user id.
    #[must_use]
    pub fn with_bot_id(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = bot_id.into();
        self
    }

    /// Set the bot display name.
    #[must_use]
    pub fn with_bot_name(mut self, bot_name: impl Into<String>) -> Self {
        self.bot_name = bot_name.into();
        self
    }

    /// The `host:port` string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
