//! Configuration validation.
//!
//! Validates configuration at load time to catch common errors early.

use super::Config;
use super::defaults::MAX_PING_SEND_INTERVAL;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("database.path is required")]
    MissingDatabasePath,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
    #[error("modules.ping.send_interval must be positive when modules.ping.send is enabled")]
    ZeroPingInterval,
    #[error("modules.ping.send_interval must not exceed 86400 seconds, got {0}")]
    PingIntervalTooLarge(u64),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let db_path = config.database.path.as_str();
    if db_path.is_empty() {
        errors.push(ValidationError::MissingDatabasePath);
    } else if db_path != ":memory:"
        && let Some(parent) = Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::DatabasePathInvalid(db_path.to_string()));
    }

    // A zero interval would probe and time out in a tight loop
    if config.modules.ping.send && config.modules.ping.send_interval == 0 {
        errors.push(ValidationError::ZeroPingInterval);
    }
    if config.modules.ping.send_interval > MAX_PING_SEND_INTERVAL {
        errors.push(ValidationError::PingIntervalTooLarge(
            config.modules.ping.send_interval,
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
