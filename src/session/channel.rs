//! mpsc-backed [`Session`] implementation.

use super::{Session, SessionError};
use parking_lot::RwLock;
use stanza_proto::{Iq, Jid, JidExt, StreamErrorCondition};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info};

/// Session whose outbound stanzas and disconnect requests are delivered over
/// unbounded mpsc channels.
///
/// Authentication and TLS are owned by other layers; they report progress
/// through [`set_username`](Self::set_username),
/// [`set_authenticated`](Self::set_authenticated) and
/// [`set_secured`](Self::set_secured).
pub struct ChannelSession {
    id: String,
    jid: Jid,
    username: RwLock<String>,
    authenticated: AtomicBool,
    secured: AtomicBool,
    closed: AtomicBool,
    outbound: mpsc::UnboundedSender<Iq>,
    disconnects: mpsc::UnboundedSender<StreamErrorCondition>,
}

/// Receiving half of a [`ChannelSession`], owned by the connection loop.
pub struct SessionReceiver {
    outbound: mpsc::UnboundedReceiver<Iq>,
    disconnects: mpsc::UnboundedReceiver<StreamErrorCondition>,
}

impl ChannelSession {
    /// Create a session for a peer at `jid`.
    ///
    /// The username starts as the JID's node, unauthenticated and insecure.
    pub fn new(id: impl Into<String>, jid: Jid) -> (Arc<Self>, SessionReceiver) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (dc_tx, dc_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            id: id.into(),
            username: RwLock::new(jid.node_str().to_string()),
            jid,
            authenticated: AtomicBool::new(false),
            secured: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            outbound: out_tx,
            disconnects: dc_tx,
        });
        let receiver = SessionReceiver {
            outbound: out_rx,
            disconnects: dc_rx,
        };
        (session, receiver)
    }

    /// Record the account name.
    pub fn set_username(&self, username: impl Into<String>) {
        *self.username.write() = username.into();
    }

    /// Record authentication state.
    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::Release);
    }

    /// Record channel security state.
    pub fn set_secured(&self, secured: bool) {
        self.secured.store(secured, Ordering::Release);
    }

    /// True after [`Session::disconnect`] was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Session for ChannelSession {
    fn username(&self) -> String {
        self.username.read().clone()
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    fn is_secured(&self) -> bool {
        self.secured.load(Ordering::Acquire)
    }

    fn jid(&self) -> Jid {
        self.jid.clone()
    }

    fn send(&self, iq: Iq) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        debug!(session = %self.id, id = %iq.id(), ty = %iq.iq_type(), "queue iq");
        self.outbound.send(iq).map_err(|_| SessionError::Closed)
    }

    fn disconnect(&self, reason: StreamErrorCondition) {
        self.closed.store(true, Ordering::Release);
        info!(session = %self.id, reason = %reason, "Disconnecting session");
        // Every request is forwarded; the connection loop owns teardown.
        let _ = self.disconnects.send(reason);
    }
}

impl SessionReceiver {
    /// Next outbound stanza; `None` once the session is dropped.
    pub async fn recv(&mut self) -> Option<Iq> {
        self.outbound.recv().await
    }

    /// Outbound stanza if one is queued.
    pub fn try_recv(&mut self) -> Option<Iq> {
        match self.outbound.try_recv() {
            Ok(iq) => Some(iq),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Next disconnect request; `None` once the session is dropped.
    pub async fn recv_disconnect(&mut self) -> Option<StreamErrorCondition> {
        self.disconnects.recv().await
    }

    /// Disconnect request if one is queued.
    pub fn try_recv_disconnect(&mut self) -> Option<StreamErrorCondition> {
        self.disconnects.try_recv().ok()
    }
}
