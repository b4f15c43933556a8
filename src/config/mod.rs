//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, DatabaseConfig, LogConfig)
//! - [`modules`]: Per-module policy (PingConfig, RegistrationConfig)
//! - [`defaults`]: serde default functions
//! - [`validation`]: Post-parse sanity checks

mod defaults;
mod modules;
mod types;
mod validation;

pub use defaults::MAX_PING_SEND_INTERVAL;
pub use modules::{ModulesConfig, PingConfig, RegistrationConfig};
pub use types::{Config, ConfigError, DatabaseConfig, LogConfig, LogFormat};
pub use validation::{ValidationError, validate};
