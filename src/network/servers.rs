//! Live server set and action routing.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, mpsc::error::TrySendError};
use tracing::{debug, warn};

use super::connection::Connection;
use super::settings::ServerSettings;
use crate::error::RoutingError;
use crate::event::Action;

/// Name → live connection map.
///
/// Reads (routing) are lock-free through the `DashMap`. Structural changes that
/// must be consistent with a decision made on the current contents (reconcile,
/// error recovery) take [`ServerSet::lock`] first.
#[derive(Default)]
pub struct ServerSet {
    live: DashMap<String, Arc<dyn Connection>>,
    lock: Mutex<()>,
}

impl ServerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialise structural changes.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Connection>> {
        self.live.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Register `connection` under `name`, returning the handle it replaced.
    pub fn insert(&self, name: &str, connection: Arc<dyn Connection>) -> Option<Arc<dyn Connection>> {
        self.live.insert(name.to_owned(), connection)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn Connection>> {
        self.live.remove(name).map(|(_, connection)| connection)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.live.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Current settings of every live connection.
    pub fn settings(&self) -> HashMap<String, ServerSettings> {
        self.live
            .iter()
            .map(|e| (e.key().clone(), e.value().settings().clone()))
            .collect()
    }

    /// Enqueue an action on its target's outbound queue without waiting.
    pub fn deliver(&self, action: &Action) -> Result<(), RoutingError> {
        let connection = self
            .get(&action.network)
            .ok_or_else(|| RoutingError::UnknownNetwork(action.network.clone()))?;

        match connection.outbound().try_send(action.to_message()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(RoutingError::QueueFull(action.network.clone())),
            Err(TrySendError::Closed(_)) => {
                Err(RoutingError::Disconnected(action.network.clone()))
            }
        }
    }

    /// Deliver every action, logging and dropping the ones that can't be routed.
    pub fn deliver_all(&self, actions: Vec<Action>) {
        for action in actions {
            match self.deliver(&action) {
                Ok(()) => debug!(network = %action.network, command = %action.command, "Action queued"),
                Err(e) => warn!(
                    network = %action.network,
                    command = %action.command,
                    error = %e,
                    "Action dropped"
                ),
            }
        }
    }

    /// Close and forget every connection.
    pub fn close_all(&self) {
        let names = self.names();
        for name in names {
            if let Some(connection) = self.remove(&name) {
                connection.close();
            }
        }
    }
}
