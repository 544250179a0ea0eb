//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and loading
//! - [`defaults`]: serde default value functions
//! - [`validation`]: startup checks that must pass before the bot starts

mod defaults;
mod types;
mod validation;

pub use types::{BotConfig, Config, ConfigError, HttpConfig};
pub use validation::ValidationError;
