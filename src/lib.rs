//! stanzad: pluggable IQ modules for stanza-based server sessions.
//!
//! A session owns a [`handlers::Registry`] built from configuration. The
//! registry offers each inbound IQ to its modules in order:
//!
//! - keepalive ([`handlers::PingModule`], XEP-0199)
//! - in-band registration ([`handlers::RegisterModule`], XEP-0077)
//!
//! Modules reach the connection only through [`session::Session`] and
//! persist accounts only through [`db::AccountStore`].

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod session;
pub mod telemetry;
