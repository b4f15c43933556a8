//! Session collaborator.
//!
//! IQ modules never touch the transport. They see the connection through the
//! [`Session`] trait: who the peer is, whether it authenticated and secured
//! the channel, a non-blocking outbound send, and a fatal disconnect.
//!
//! [`ChannelSession`] is the stock implementation, backed by mpsc channels
//! whose receiving half ([`SessionReceiver`]) belongs to the connection loop.

mod channel;

pub use channel::{ChannelSession, SessionReceiver};

use stanza_proto::{Iq, Jid, StreamErrorCondition};
use thiserror::Error;

/// Errors returned by [`Session::send`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session closed")]
    Closed,
}

/// What an IQ module may observe and do on its owning connection.
///
/// Implementations must be cheap to call from any task: `send` and
/// `disconnect` never block.
pub trait Session: Send + Sync {
    /// Account name the peer authenticated as, or `""` before authentication.
    fn username(&self) -> String;

    /// True once SASL (or equivalent) has succeeded.
    fn is_authenticated(&self) -> bool;

    /// True once the channel is transport-secured (TLS).
    fn is_secured(&self) -> bool;

    /// The peer's address as seen by the server.
    fn jid(&self) -> Jid;

    /// Queue a stanza for the peer.
    fn send(&self, iq: Iq) -> Result<(), SessionError>;

    /// Terminate the session with a stream-level error.
    fn disconnect(&self, reason: StreamErrorCondition);
}
