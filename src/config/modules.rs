//! Per-module policy configuration.

use super::defaults::{MAX_PING_SEND_INTERVAL, default_ping_send_interval};
use serde::Deserialize;
use std::time::Duration;

/// Policy for every IQ module attached to a session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModulesConfig {
    /// XEP-0199 keepalive.
    #[serde(default)]
    pub ping: PingConfig,
    /// XEP-0077 in-band registration.
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// Keepalive (XEP-0199) policy.
///
/// When `send` is enabled the server probes the peer every `send_interval`
/// seconds and drops the session with `connection-timeout` if a probe goes
/// unanswered for another `send_interval` seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct PingConfig {
    /// Whether the server sends probes at all (default: false).
    #[serde(default)]
    pub send: bool,
    /// Seconds between probes and per-probe answer deadline (default: 60).
    #[serde(default = "default_ping_send_interval")]
    pub send_interval: u64,
}

impl PingConfig {
    /// `send_interval` as a [`Duration`], capped at one day.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.send_interval.min(MAX_PING_SEND_INTERVAL))
    }
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            send: false,
            send_interval: default_ping_send_interval(),
        }
    }
}

/// In-band registration (XEP-0077) policy. Everything is off by default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationConfig {
    /// Allow unauthenticated sessions to create accounts.
    #[serde(default)]
    pub allow_registration: bool,
    /// Allow authenticated sessions to change their password.
    #[serde(default)]
    pub allow_change: bool,
    /// Allow authenticated sessions to delete their account.
    #[serde(default)]
    pub allow_cancel: bool,
}
