//! Configuration validation.
//!
//! Validates configuration at startup to catch fatal errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.script is required (or set BANANABOAT_SCRIPT)")]
    MissingScript,
    #[error("bot.outbound_queue must be at least 1")]
    ZeroOutboundQueue,
    #[error("bot.max_reconnect must be at least 1 second")]
    ZeroMaxReconnect,
}

/// Validate a configuration, returning the first fatal problem.
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.bot.script.as_os_str().is_empty() {
        return Err(ValidationError::MissingScript);
    }
    if config.bot.outbound_queue == 0 {
        return Err(ValidationError::ZeroOutboundQueue);
    }
    if config.bot.max_reconnect == 0 {
        return Err(ValidationError::ZeroMaxReconnect);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate(&Config::for_script("bot.lua")).is_ok());
    }

    #[test]
    fn test_zero_queue_rejected() {
        let mut config = Config::for_script("bot.lua");
        config.bot.outbound_queue = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroOutboundQueue)
        ));
    }

    #[test]
    fn test_zero_max_reconnect_rejected() {
        let mut config = Config::for_script("bot.lua");
        config.bot.max_reconnect = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroMaxReconnect)
        ));
    }

    #[test]
    fn test_empty_script_rejected() {
        assert!(matches!(
            validate(&Config::for_script("")),
            Err(ValidationError::MissingScript)
        ));
    }
}
