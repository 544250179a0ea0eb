//! Unified error handling for bananaboatbot.
//!
//! Failures are split by how far they are allowed to travel: only startup
//! configuration and script loading block forward progress; everything else is
//! logged at the point of failure and degrades to "no effect".

use thiserror::Error;

use crate::config::ConfigError;
use crate::script::DefinitionError;

/// Errors surfaced by the bot core.
#[derive(Debug, Error)]
pub enum BotError {
    /// Configuration unusable; the process must not start.
    #[error("startup configuration: {0}")]
    StartupConfig(#[from] ConfigError),

    /// The script could not be executed or returned a malformed definition.
    /// Prior registry and server set are kept.
    #[error("script load failed: {0}")]
    ScriptLoad(#[from] ScriptLoadError),

    /// A protected script call faulted.
    #[error("handler for {command} failed: {source}")]
    HandlerFault {
        command: String,
        #[source]
        source: mlua::Error,
    },

    /// An action could not be routed to a live connection.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// The transport reported a failure.
    #[error("connection {network} failed: {source}")]
    Connection {
        network: String,
        #[source]
        source: TransportError,
    },

    /// A third-party HTTP integration failed.
    #[error(transparent)]
    ExternalApi(#[from] ExternalApiError),
}

impl BotError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::StartupConfig(_) => "startup_config",
            Self::ScriptLoad(_) => "script_load",
            Self::HandlerFault { .. } => "handler_fault",
            Self::Routing(RoutingError::UnknownNetwork(_)) => "unknown_network",
            Self::Routing(RoutingError::QueueFull(_)) => "queue_full",
            Self::Routing(RoutingError::Disconnected(_)) => "disconnected",
            Self::Connection { .. } => "connection",
            Self::ExternalApi(_) => "external_api",
        }
    }
}

/// Reasons a reload is rejected.
#[derive(Debug, Error)]
pub enum ScriptLoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("lua error: {0}")]
    Lua(#[from] mlua::Error),

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Delivery failures for script-produced actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("invalid server: {0}")]
    UnknownNetwork(String),

    #[error("outbound queue full for {0}, message dropped")]
    QueueFull(String),

    #[error("connection {0} is not running, message dropped")]
    Disconnected(String),
}

/// Transport-level connection failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connect to {0} timed out")]
    ConnectTimeout(String),

    #[error("tls error: {0}")]
    Tls(String),

    #[error("line codec error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),

    #[error("connection closed by server")]
    Closed,

    #[error("connection already dialed")]
    AlreadyDialed,
}

/// Failures of the HTTP integrations. Scripts only ever see `nil`.
#[derive(Debug, Error)]
pub enum ExternalApiError {
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(String),

    #[error("non-OK status: {0}")]
    Status(u16),

    #[error("wrong content-type: {0}")]
    ContentType(String),

    #[error("no content-type header")]
    MissingContentType,

    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(&'static str),
}
