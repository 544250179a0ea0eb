//! Connection handle contract.
//!
//! The bot core never touches sockets. It creates connections through a
//! [`Connector`], talks to them through [`Connection`], and receives their
//! traffic through [`ConnectionEvents`].

use async_trait::async_trait;
use bananaboat_proto::Message;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::backoff::Backoff;
use super::generation::Generation;
use super::settings::ServerSettings;
use crate::error::TransportError;

/// One live connection instance.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Configured name of the network.
    fn name(&self) -> &str;

    fn settings(&self) -> &ServerSettings;

    /// Identity of this instance.
    fn generation(&self) -> &Generation;

    /// Bounded outbound queue. Producers must use `try_send`.
    fn outbound(&self) -> &mpsc::Sender<Message>;

    fn backoff(&self) -> Backoff;

    fn set_backoff(&self, backoff: Backoff);

    /// Sleep for the next backoff interval; returns early if closed.
    async fn reconnect_wait(&self);

    /// Connect and run until the connection fails or is closed.
    ///
    /// Failures are reported through [`ConnectionEvents::error`] unless the
    /// instance has been closed.
    async fn dial(&self);

    /// Tear down this instance. Idempotent.
    fn close(&self);
}

/// Receiver of a connection's inbound traffic and failures.
#[async_trait]
pub trait ConnectionEvents: Send + Sync {
    /// Called for each inbound message, in order, from the connection's task.
    async fn message(&self, network: &str, message: Message);

    /// Called once when the instance identified by `generation` fails.
    async fn error(&self, network: &str, generation: Generation, error: TransportError);
}

/// Factory for connection instances.
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        name: &str,
        settings: ServerSettings,
        events: Arc<dyn ConnectionEvents>,
    ) -> Arc<dyn Connection>;
}
