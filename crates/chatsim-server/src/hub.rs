//! Address-keyed registry of per-instance queue sets.
//!
//! Request handlers only see a request, never the
//! [`ServerInstance`](crate::instance::ServerInstance) that serves it. The
//! hub lets them recover the right [`MessageQueueSet`] from the
//! instance's network address alone, so any number of simulated servers
//! can run in one test binary without sharing mutable state.
//!
//! The hub is an explicit object injected into every handler through
//! [`AppState`](crate::state::AppState). [`InstanceHub::shared`] hands out
//! one process-wide hub for callers that do not bring their own.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use tracing::debug;

use crate::error::HubError;
use crate::queue::{MessageQueueSet, read_lock, write_lock};

/// Registry mapping instance address to its queue set.
#[derive(Debug, Default)]
pub struct InstanceHub {
    queues: RwLock<HashMap<String, Arc<MessageQueueSet>>>,
}

impl InstanceHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide hub used by
    /// [`ServerInstance::start`](crate::instance::ServerInstance::start).
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<InstanceHub>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::new())))
    }

    /// Bind `address` to `queues`.
    ///
    /// The binding is visible to every subsequent [`lookup`](Self::lookup)
    /// from any thread as soon as this returns.
    ///
    /// # Errors
    ///
    /// - [`HubError::EmptyInstance`] if `queues` is `None`
    /// - [`HubError::EmptyAddress`] if `address` is empty
    /// - [`HubError::AddressInUse`] if another instance holds `address`
    pub fn register(
        &self,
        address: &str,
        queues: Option<Arc<MessageQueueSet>>,
    ) -> Result<(), HubError> {
        let queues = queues.ok_or(HubError::EmptyInstance)?;
        if address.is_empty() {
            return Err(HubError::EmptyAddress);
        }

        let mut map = write_lock(&self.queues);
        if map.contains_key(address) {
            return Err(HubError::AddressInUse(address.to_owned()));
        }
        map.insert(address.to_owned(), queues);
        debug!(address, instances = map.len(), "instance registered");
        Ok(())
    }

    /// Resolve the queue set bound to `address`.
    ///
    /// Returns the shared set itself, not a copy: mutations through one
    /// caller are visible to all.
    ///
    /// # Errors
    ///
    /// - [`HubError::EmptyAddress`] if `address` is empty
    /// - [`HubError::NoQueuesRegistered`] if nothing is bound to `address`
    pub fn lookup(&self, address: &str) -> Result<Arc<MessageQueueSet>, HubError> {
        if address.is_empty() {
            return Err(HubError::EmptyAddress);
        }
        read_lock(&self.queues)
            .get(address)
            .cloned()
            .ok_or_else(|| HubError::NoQueuesRegistered(address.to_owned()))
    }

    /// Remove the binding for `address`, returning the queue set it held.
    pub fn deregister(&self, address: &str) -> Option<Arc<MessageQueueSet>> {
        let removed = write_lock(&self.queues).remove(address);
        if removed.is_some() {
            debug!(address, "instance deregistered");
        }
        removed
    }

    /// Whether `address` is currently bound.
    pub fn contains(&self, address: &str) -> bool {
        read_lock(&self.queues).contains_key(address)
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        read_lock(&self.queues).len()
    }

    /// Whether no instance is registered.
    pub fn is_empty(&self) -> bool {
        read_lock(&self.queues).is_empty()
    }
}
