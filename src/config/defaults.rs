//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Database Defaults
// =============================================================================

pub fn default_database_path() -> String {
    "stanzad.db".to_string()
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_level() -> String {
    "info".to_string()
}

// =============================================================================
// Keepalive Defaults
// =============================================================================

/// Seconds between keepalive probes, and the time allowed for each answer.
pub fn default_ping_send_interval() -> u64 {
    60
}

/// Upper bound on `send_interval`, one day.
pub const MAX_PING_SEND_INTERVAL: u64 = 86_400;
