//! Replacing connections after transport errors.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::Bot;
use crate::error::{BotError, TransportError};
use crate::network::{Connection, Generation};

impl Bot {
    /// React to a failure reported by the instance identified by `generation`.
    ///
    /// Errors from instances that have since been replaced or removed are
    /// ignored. Otherwise the failed instance is swapped for a fresh one that
    /// inherits its backoff, waits, and dials. Returns the replacement.
    pub async fn handle_connection_error(
        &self,
        network: &str,
        generation: Generation,
        error: TransportError,
    ) -> Option<Arc<dyn Connection>> {
        let error = BotError::Connection {
            network: network.to_owned(),
            source: error,
        };
        warn!(network, error = %error, code = error.error_code(), "Connection error");

        let replacement = {
            let _guard = self.servers.lock().await;

            let Some(current) = self.servers.get(network) else {
                debug!(network, "Server no longer configured, not reconnecting");
                return None;
            };
            if !current.generation().same_instance(&generation) {
                debug!(network, "Error from superseded connection ignored");
                return None;
            }

            current.close();
            let replacement = self.connector.connect(
                network,
                current.settings().clone(),
                Arc::clone(&self.events),
            );
            replacement.set_backoff(current.backoff());
            self.servers.insert(network, Arc::clone(&replacement));
            replacement
        };

        info!(network, attempt = replacement.backoff().attempts() + 1, "Reconnecting");
        let connection = Arc::clone(&replacement);
        tokio::spawn(async move {
            connection.reconnect_wait().await;
            if !connection.generation().is_cancelled() {
                connection.dial().await;
            }
        });

        Some(replacement)
    }
}
