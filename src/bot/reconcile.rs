//! Bringing live connections in line with the declared servers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

use super::Bot;
use crate::network::{Connection, ServerSettings};

/// What a reload does to each server name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Declared, not live.
    pub create: Vec<String>,
    /// Live with different settings.
    pub replace: Vec<String>,
    /// Live with identical settings.
    pub keep: Vec<String>,
    /// Live, no longer declared.
    pub remove: Vec<String>,
}

impl ReconcilePlan {
    /// Diff `desired` against the settings of the live connections.
    ///
    /// Every list comes out sorted by name.
    pub fn compute(
        desired: &BTreeMap<String, ServerSettings>,
        live: &HashMap<String, ServerSettings>,
    ) -> Self {
        let mut plan = Self::default();

        for (name, settings) in desired {
            match live.get(name) {
                None => plan.create.push(name.clone()),
                Some(current) if current != settings => plan.replace.push(name.clone()),
                Some(_) => plan.keep.push(name.clone()),
            }
        }

        plan.remove = live
            .keys()
            .filter(|name| !desired.contains_key(*name))
            .cloned()
            .collect();
        plan.remove.sort();

        plan
    }
}

impl Bot {
    /// Apply `desired` under the server-set lock.
    ///
    /// New and replaced connections start dialing on their own tasks.
    pub(crate) async fn reconcile(&self, desired: BTreeMap<String, ServerSettings>) -> ReconcilePlan {
        let _guard = self.servers.lock().await;
        let plan = ReconcilePlan::compute(&desired, &self.servers.settings());

        for name in &plan.replace {
            if let Some(old) = self.servers.remove(name) {
                info!(server = %name, "Destroying pre-existing IRC server");
                old.close();
            }
        }

        for name in plan.create.iter().chain(&plan.replace) {
            let Some(settings) = desired.get(name) else {
                continue;
            };
            info!(server = %name, address = %settings.address(), "Creating new IRC server");
            let connection =
                self.connector
                    .connect(name, settings.clone(), Arc::clone(&self.events));
            self.servers.insert(name, Arc::clone(&connection));
            spawn_dial(connection);
        }

        for name in &plan.remove {
            if let Some(old) = self.servers.remove(name) {
                info!(server = %name, "Destroying removed IRC server");
                old.close();
            }
        }

        plan
    }
}

fn spawn_dial(connection: Arc<dyn Connection>) {
    tokio::spawn(async move { connection.dial().await });
}
