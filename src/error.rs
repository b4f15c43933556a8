//! Unified error handling for stanzad.
//!
//! Stanza-level failures (bad-request, not-allowed, ...) are *answers*, not
//! errors: handlers send them to the peer and return `Ok(())`. The types here
//! cover what remains: the session refusing an outbound stanza, or a handler
//! used without a session.

use crate::session::SessionError;
use thiserror::Error;

// ============================================================================
// Handler Errors (IQ processing)
// ============================================================================

/// Errors that can occur while processing an IQ.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("send error: {0}")]
    Send(#[from] SessionError),

    #[error("module has no session attached")]
    NoSession,
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Send(_) => "send_error",
            Self::NoSession => "no_session",
        }
    }
}

/// Result type for IQ handlers.
pub type HandlerResult = Result<(), HandlerError>;
