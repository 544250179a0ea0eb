//! bananaboatbot - an IRC bot whose behaviour lives entirely in a Lua script.
//!
//! The crate routes inbound IRC messages to script handlers, forwards the
//! actions they return, and keeps the set of live server connections in line
//! with what the script declares across reloads.

pub mod apis;
pub mod bot;
pub mod config;
pub mod error;
pub mod event;
pub mod network;
pub mod script;
pub mod telemetry;

pub use bot::Bot;
pub use config::Config;
pub use error::BotError;
pub use event::{Action, Event};
