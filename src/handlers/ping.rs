//! XEP-0199 keepalive.
//!
//! Answers inbound `<ping xmlns="urn:xmpp:ping"/>` requests and, when
//! `modules.ping.send` is enabled, probes the peer on a fixed interval.
//!
//! ## Probe lifecycle
//!
//! ```text
//!   Idle --interval--> ProbeSent --ack--> Idle
//!                          |
//!                          +--interval, no ack--> disconnect(connection-timeout)
//! ```
//!
//! One background task drives the chain. The acknowledgment path runs on the
//! session's request path and hands off to the task through a capacity-one
//! channel, using `try_send` so a late or duplicate answer never blocks.

use super::core::IqHandler;
use crate::config::PingConfig;
use crate::error::{HandlerError, HandlerResult};
use crate::session::Session;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use stanza_proto::{
    Element, Iq, IqType, JidExt, StanzaErrorCondition, StreamErrorCondition, ns,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Notify, mpsc};
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

const NAMESPACES: &[&str] = &[ns::PING];

/// Keepalive module for one session.
///
/// Cheap to clone; clones share the same probe state, so the dispatcher can
/// own one copy while the connection loop keeps another for
/// [`start_pinging`](Self::start_pinging) and
/// [`reset_deadline`](Self::reset_deadline).
#[derive(Clone)]
pub struct PingModule {
    inner: Arc<Inner>,
}

struct Inner {
    config: PingConfig,
    session: Option<Arc<dyn Session>>,
    /// Id of the outstanding probe; empty when none.
    probe_id: RwLock<String>,
    /// Fast-path gate for `probe_id`.
    awaiting: AtomicBool,
    started: AtomicBool,
    pong_tx: mpsc::Sender<()>,
    pong_rx: Mutex<Option<mpsc::Receiver<()>>>,
    deadline_reset: Notify,
    cancel: CancellationToken,
}

impl PingModule {
    /// Create the module. A `None` session is only useful for namespace
    /// introspection.
    pub fn new(config: PingConfig, session: Option<Arc<dyn Session>>) -> Self {
        let (pong_tx, pong_rx) = mpsc::channel(1);
        Self {
            inner: Arc::new(Inner {
                config,
                session,
                probe_id: RwLock::new(String::new()),
                awaiting: AtomicBool::new(false),
                started: AtomicBool::new(false),
                pong_tx,
                pong_rx: Mutex::new(Some(pong_rx)),
                deadline_reset: Notify::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Begin probing the peer.
    ///
    /// Only the first call has any effect. Does nothing when sending is
    /// disabled, without a session, or outside a Tokio runtime.
    pub fn start_pinging(&self) {
        let inner = &self.inner;
        if !inner.config.send {
            return;
        }
        let Some(session) = inner.session.clone() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("start_pinging called outside a Tokio runtime");
            return;
        };
        if inner
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let Some(pong_rx) = inner.pong_rx.lock().take() else {
            return;
        };

        debug!(interval = inner.config.send_interval, "Keepalive started");
        handle.spawn(run_probes(Arc::clone(inner), session, pong_rx));
    }

    /// Restart the answer deadline of the outstanding probe.
    ///
    /// No-op when no probe is outstanding.
    pub fn reset_deadline(&self) {
        if self.inner.awaiting.load(Ordering::Acquire) {
            self.inner.deadline_reset.notify_one();
        }
    }

    /// True while a probe awaits its answer.
    pub fn is_awaiting(&self) -> bool {
        self.inner.awaiting.load(Ordering::Acquire)
    }

    /// Whether `iq` answers the outstanding probe.
    fn is_ack(&self, iq: &Iq) -> bool {
        if !matches!(iq.iq_type(), IqType::Result | IqType::Error) {
            return false;
        }
        if !self.inner.awaiting.load(Ordering::Acquire) {
            return false;
        }
        let probe_id = self.inner.probe_id.read();
        !probe_id.is_empty() && probe_id.as_str() == iq.id()
    }

    fn handle_ack(&self, iq: &Iq) {
        let inner = &self.inner;
        inner.probe_id.write().clear();
        inner.awaiting.store(false, Ordering::Release);
        // A full channel already carries a wake-up for the task.
        let _ = inner.pong_tx.try_send(());
        info!(id = %iq.id(), "Keepalive acknowledged");
    }

    fn answer_ping(&self, iq: &Iq, session: &dyn Session) -> HandlerResult {
        let reply = match ping_violation(iq, &session.username()) {
            Some(condition) => iq.error_iq(condition),
            None => {
                info!(id = %iq.id(), username = %session.username(), "Answered ping");
                iq.result_iq()
            }
        };
        session.send(reply)?;
        Ok(())
    }
}

/// Error condition for an inbound ping, or `None` when it deserves a result.
fn ping_violation(iq: &Iq, username: &str) -> Option<StanzaErrorCondition> {
    // A missing `to` addresses the sender's own account.
    if let Some(to) = iq.to()
        && to.node_str() != username
    {
        return Some(StanzaErrorCondition::Forbidden);
    }
    let has_children = iq
        .get_child("ping", ns::PING)
        .is_some_and(|ping| ping.children().next().is_some());
    if has_children || !iq.is_get() {
        return Some(StanzaErrorCondition::BadRequest);
    }
    None
}

#[async_trait]
impl IqHandler for PingModule {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn namespaces(&self) -> &'static [&'static str] {
        NAMESPACES
    }

    fn matches_iq(&self, iq: &Iq) -> bool {
        self.is_ack(iq) || iq.get_child("ping", ns::PING).is_some()
    }

    async fn process_iq(&self, iq: &Iq) -> HandlerResult {
        if self.is_ack(iq) {
            self.handle_ack(iq);
            return Ok(());
        }
        let session = self.inner.session.as_deref().ok_or(HandlerError::NoSession)?;
        self.answer_ping(iq, session)
    }

    fn shutdown(&self) {
        if !self.inner.cancel.is_cancelled() {
            debug!("Keepalive stopped");
        }
        self.inner.cancel.cancel();
    }
}

impl Inner {
    /// Arm the probe state and send a fresh probe. Returns false when the
    /// session refused it.
    fn send_probe(&self, session: &dyn Session) -> bool {
        let id = Uuid::new_v4().to_string();
        *self.probe_id.write() = id.clone();
        // Armed before sending so an answer racing the send is recognised.
        self.awaiting.store(true, Ordering::Release);

        let probe = Iq::new(id.clone(), IqType::Get)
            .with_to(session.jid())
            .with_child(Element::builder("ping", ns::PING).build());
        match session.send(probe) {
            Ok(()) => {
                info!(id = %id, "Sent keepalive probe");
                true
            }
            Err(e) => {
                debug!(id = %id, error = %e, "Keepalive probe not sent");
                self.awaiting.store(false, Ordering::Release);
                self.probe_id.write().clear();
                false
            }
        }
    }
}

/// The timer chain: wait an interval, probe, wait for the answer, repeat.
async fn run_probes(
    inner: Arc<Inner>,
    session: Arc<dyn Session>,
    mut pong_rx: mpsc::Receiver<()>,
) {
    let interval = inner.config.interval();
    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => return,
            _ = sleep(interval) => {}
        }

        // Drop wake-ups left by answers to earlier probes.
        while pong_rx.try_recv().is_ok() {}

        if !inner.send_probe(session.as_ref()) {
            return;
        }

        let mut deadline = Instant::now() + interval;
        loop {
            tokio::select! {
                biased;
                _ = inner.cancel.cancelled() => return,
                ack = pong_rx.recv() => {
                    if ack.is_none() {
                        return;
                    }
                    break;
                }
                _ = inner.deadline_reset.notified() => {
                    deadline = Instant::now() + interval;
                }
                _ = sleep_until(deadline) => {
                    // The ack path clears `awaiting` before signalling.
                    if !inner.awaiting.load(Ordering::Acquire) {
                        break;
                    }
                    warn!(
                        username = %session.username(),
                        interval = inner.config.send_interval,
                        "Keepalive probe unanswered, closing session"
                    );
                    crate::metrics::record_ping_timeout();
                    session.disconnect(StreamErrorCondition::ConnectionTimeout);
                    return;
                }
            }
        }
    }
}
