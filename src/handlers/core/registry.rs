//! IQ module registry and dispatch.
//!
//! The `Registry` holds the modules attached to one session, in registration
//! order, and delivers each inbound IQ to the first module that claims it.

use super::traits::IqHandler;
use crate::config::ModulesConfig;
use crate::db::AccountStore;
use crate::error::HandlerError;
use crate::handlers::{PingModule, RegisterModule};
use crate::session::Session;
use crate::telemetry::{IqTimer, spans};
use stanza_proto::{Iq, StanzaErrorCondition};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Instrument, debug};

/// Outcome of [`Registry::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Processed by the named module.
    Handled(&'static str),
    /// No module matched.
    Unhandled,
}

/// Ordered set of IQ modules for one session.
pub struct Registry {
    handlers: Vec<Box<dyn IqHandler>>,
    session: Option<Arc<dyn Session>>,
    ping: Option<PingModule>,
    shut_down: AtomicBool,
}

impl Registry {
    /// Create an empty registry with no session attached.
    ///
    /// Unmatched requests are only counted, since there is nobody to answer.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            session: None,
            ping: None,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Create an empty registry answering unmatched requests on `session`.
    pub fn with_session(session: Arc<dyn Session>) -> Self {
        Self {
            handlers: Vec::new(),
            session: Some(session),
            ping: None,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Build the standard module set for one session: registration, then
    /// keepalive.
    pub fn from_config(
        config: &ModulesConfig,
        session: Arc<dyn Session>,
        store: Arc<dyn AccountStore>,
    ) -> Self {
        let mut registry = Self::with_session(Arc::clone(&session));

        registry.register(Box::new(RegisterModule::new(
            config.registration.clone(),
            Some(Arc::clone(&session)),
            store,
        )));

        let ping = PingModule::new(config.ping.clone(), Some(session));
        registry.register(Box::new(ping.clone()));
        registry.ping = Some(ping);

        registry
    }

    /// Append a module. Earlier modules take precedence.
    pub fn register(&mut self, handler: Box<dyn IqHandler>) {
        debug!(module = handler.name(), "Registered IQ module");
        self.handlers.push(handler);
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Keepalive handle, when built by [`from_config`](Self::from_config).
    pub fn ping(&self) -> Option<&PingModule> {
        self.ping.as_ref()
    }

    /// Every namespace claimed by a module, first occurrence first.
    pub fn namespaces(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for ns in self.handlers.iter().flat_map(|h| h.namespaces()) {
            if !out.contains(ns) {
                out.push(*ns);
            }
        }
        out
    }

    /// Dispatch an IQ to the first matching module.
    ///
    /// An unmatched `get`/`set` is answered with `service-unavailable`; an
    /// unmatched `result`/`error` is dropped.
    pub async fn dispatch(&self, iq: &Iq) -> Result<Dispatch, HandlerError> {
        let Some(handler) = self.handlers.iter().find(|h| h.matches_iq(iq)) else {
            return self.unhandled(iq);
        };

        let name = handler.name();
        let span = spans::iq(name, iq.id(), iq.iq_type().as_str());
        let _timer = IqTimer::new(name);

        let result = handler.process_iq(iq).instrument(span).await;

        if let Err(ref e) = result {
            crate::metrics::record_iq_error(name, e.error_code());
            debug!(module = name, id = %iq.id(), error = %e, "IQ handler error");
        }

        result.map(|()| Dispatch::Handled(name))
    }

    fn unhandled(&self, iq: &Iq) -> Result<Dispatch, HandlerError> {
        if !iq.iq_type().is_request() {
            debug!(id = %iq.id(), ty = %iq.iq_type(), "Dropping unmatched IQ response");
            return Ok(Dispatch::Unhandled);
        }

        crate::metrics::record_unhandled();
        debug!(id = %iq.id(), "No module for IQ");
        if let Some(session) = &self.session {
            session.send(iq.error_iq(StanzaErrorCondition::ServiceUnavailable))?;
        }
        Ok(Dispatch::Unhandled)
    }

    /// Shut every module down. Only the first call has any effect.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        for handler in &self.handlers {
            handler.shutdown();
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.shutdown();
    }
}
