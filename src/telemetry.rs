//! Telemetry utilities for dispatch timing and span construction.

use std::time::Instant;
use tracing::debug;

/// Guard timing one handler dispatch.
///
/// Logs the elapsed time at debug level when dropped.
pub struct DispatchTimer {
    network: String,
    command: String,
    start: Instant,
}

impl DispatchTimer {
    pub fn new(network: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for DispatchTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            network = %self.network,
            command = %self.command,
            elapsed_ms,
            "Dispatch finished"
        );
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one server connection instance.
    pub fn connection(network: &str, address: &str) -> Span {
        info_span!("connection", network = %network, address = %address)
    }

    /// Span for handling one inbound event.
    pub fn dispatch(network: &str, command: &str, source: Option<&str>) -> Span {
        if let Some(source) = source {
            info_span!("dispatch", network = %network, command = %command, source = %source)
        } else {
            info_span!("dispatch", network = %network, command = %command)
        }
    }

    /// Span for a detached worker job.
    pub fn worker(network: &str) -> Span {
        info_span!("worker", network = %network)
    }

    /// Span for a script (re)load.
    pub fn reload(path: &str) -> Span {
        info_span!("reload", path = %path)
    }
}
