//! Declarative settings for one named server connection.

use std::time::Duration;

/// Everything needed to (re)create a connection.
///
/// Equality is field-by-field; the reconciler recreates a connection exactly
/// when the newly declared settings differ from the live ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub verify_tls: bool,
    pub nick: String,
    pub username: String,
    pub realname: String,
    /// Cap of the reconnect backoff, in seconds.
    pub max_reconnect: u64,
}

impl ServerSettings {
    /// `host:port` for dialing and logs.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_reconnect(&self) -> Duration {
        Duration::from_secs(self.max_reconnect)
    }
}
