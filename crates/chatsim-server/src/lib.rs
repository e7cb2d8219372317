//! Process-local chat platform simulator for testing bots.
//!
//! This crate runs a fake chat server inside the test process. A bot under
//! test is pointed at [`ServerInstance::api_url`] and talks to it exactly
//! as it would to the real platform:
//!
//! - **HTTP API** (`/rtm.start`, `/rtm.connect`, `/chat.postMessage`, the
//!   listing and lookup methods) answering with canned fixtures
//! - **Session socket** (`/ws`) that pushes queued events to the client,
//!   answers heartbeat probes, and records every other frame
//!
//! The test drives the other side through the [`ServerInstance`] facade:
//! inject messages and invites, then assert on what the client sent
//! ([`ServerInstance::was_seen`]) or was sent
//! ([`ServerInstance::was_delivered`]).
//!
//! # Architecture
//!
//! Every instance owns one [`MessageQueueSet`], registered in an
//! [`InstanceHub`] under the instance's `host:port` address. Request
//! handlers resolve the queue set through the hub on every call, so any
//! number of instances run side by side in one process without sharing
//! state. Open sessions compete for the instance's outbound queue: each
//! queued message reaches exactly one client.

pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod instance;
pub mod queue;
pub mod router;
pub mod server;
pub mod session;
pub mod state;

// Re-export primary types for convenience.
pub use config::SimConfig;
pub use error::{HubError, ServerError, SimError};
pub use hub::InstanceHub;
pub use instance::ServerInstance;
pub use queue::MessageQueueSet;
pub use router::build_router;
pub use state::AppState;
