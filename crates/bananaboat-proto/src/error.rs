//! Error types for the IRC protocol library.

use thiserror::Error;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// Failed to parse an IRC message.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The invalid message string.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors encountered when parsing IRC messages.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Message was empty.
    #[error("empty message")]
    EmptyMessage,

    /// Command was invalid or missing.
    #[error("invalid command")]
    InvalidCommand,

    /// Parse failure with position context.
    #[error("parse error at position {position}: {context}")]
    ParseContext {
        /// Byte position where parsing stopped.
        position: usize,
        /// Human readable description.
        context: String,
    },
}
