//! Server connections.
//!
//! Contains the connection contract, the TCP/TLS client implementation, the
//! live server set used for routing, and reconnect backoff.

mod backoff;
mod client;
mod codec;
mod connection;
mod generation;
mod servers;
mod settings;
mod stream;
mod tls;

pub use backoff::Backoff;
pub use client::{IrcConnection, IrcConnector};
pub use codec::IrcCodec;
pub use connection::{Connection, ConnectionEvents, Connector};
pub use generation::Generation;
pub use servers::ServerSet;
pub use settings::ServerSettings;
pub use stream::IrcStream;
