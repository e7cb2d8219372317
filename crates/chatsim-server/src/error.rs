//! Error types for the simulator.
//!
//! [`HubError`] covers registration and lookup in the
//! [`InstanceHub`](crate::hub::InstanceHub). [`SimError`] unifies the
//! failure modes of a single HTTP request and converts into an Axum
//! response via its [`IntoResponse`] implementation. [`ServerError`]
//! covers instance lifecycle.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors raised by the instance hub.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// Registration was attempted without a queue set.
    #[error("cannot register an empty instance")]
    EmptyInstance,

    /// The instance address was empty.
    #[error("instance address must not be empty")]
    EmptyAddress,

    /// No queue set is registered under the address.
    #[error("no queues registered for address {0}")]
    NoQueuesRegistered(String),

    /// Another running instance already holds the address.
    #[error("address {0} is already registered")]
    AddressInUse(String),
}

/// Errors that fail a single HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The request's instance could not be resolved through the hub.
    #[error("instance lookup failed: {0}")]
    Hub(#[from] HubError),

    /// The form body could not be decoded.
    #[error("invalid form body: {0}")]
    InvalidForm(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for SimError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidForm(_) => StatusCode::BAD_REQUEST,
            Self::Hub(_) | Self::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "ok": false,
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Errors that can occur when starting, running or configuring an
/// instance.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),

    /// The instance could not be registered with the hub.
    #[error("hub error: {0}")]
    Hub(#[from] HubError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_errors_map_to_server_error_status() {
        let response = SimError::from(HubError::NoQueuesRegistered(String::from("x"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn form_errors_map_to_bad_request() {
        let response = SimError::InvalidForm(String::from("missing channel")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
