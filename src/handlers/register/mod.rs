//! XEP-0077 in-band registration.
//!
//! Lets a peer create an account before authenticating, and change its
//! password or delete its account afterwards. Each operation is gated by its
//! own `modules.registration` flag; a disabled operation is refused before
//! storage is touched.
//!
//! The flows live in their own files:
//! - [`create`]: discovery form and account creation (unauthenticated)
//! - [`cancel`]: account removal (authenticated)
//! - [`password`]: password change (authenticated, secured channel)

mod cancel;
mod create;
mod form;
mod password;

pub use form::{Credentials, discovery_form, parse_credentials};

use super::core::IqHandler;
use crate::config::RegistrationConfig;
use crate::db::AccountStore;
use crate::error::{HandlerError, HandlerResult};
use crate::session::Session;
use async_trait::async_trait;
use stanza_proto::{Element, Iq, Jid, JidExt, StanzaErrorCondition, ns};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const NAMESPACES: &[&str] = &[ns::REGISTER];

/// What a provisioning request resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Discovery: answer with the form.
    Form(Element),
    Registered,
    Cancelled,
    PasswordChanged,
    Rejected(StanzaErrorCondition),
}

impl Outcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Form(_) => "form",
            Self::Registered => "registered",
            Self::Cancelled => "cancelled",
            Self::PasswordChanged => "password_changed",
            Self::Rejected(condition) => condition.name(),
        }
    }

    fn into_reply(self, iq: &Iq) -> Iq {
        match self {
            Self::Form(form) => iq.result_with(form),
            Self::Registered | Self::Cancelled | Self::PasswordChanged => iq.result_iq(),
            Self::Rejected(condition) => iq.error_iq(condition),
        }
    }
}

/// In-band registration module for one session.
pub struct RegisterModule {
    config: RegistrationConfig,
    session: Option<Arc<dyn Session>>,
    store: Arc<dyn AccountStore>,
    /// Set once this session created an account.
    registered: AtomicBool,
}

impl RegisterModule {
    /// Create the module. A `None` session is only useful for namespace
    /// introspection.
    pub fn new(
        config: RegistrationConfig,
        session: Option<Arc<dyn Session>>,
        store: Arc<dyn AccountStore>,
    ) -> Self {
        Self {
            config,
            session,
            store,
            registered: AtomicBool::new(false),
        }
    }

    /// Decide the outcome of a matched IQ.
    pub async fn resolve(&self, iq: &Iq, session: &dyn Session) -> Outcome {
        let username = session.username();

        if let Some(to) = iq.to()
            && misaddressed(to, &username, session.is_authenticated())
        {
            return Outcome::Rejected(StanzaErrorCondition::Forbidden);
        }

        let query = iq.get_child("query", ns::REGISTER);
        let store = self.store.as_ref();

        if !session.is_authenticated() {
            return create::handle_unauthenticated(
                &self.config,
                store,
                &self.registered,
                iq.iq_type(),
                query,
            )
            .await;
        }

        let Some(query) = query.filter(|_| iq.is_set()) else {
            return Outcome::Rejected(StanzaErrorCondition::BadRequest);
        };

        if form::is_removal(query) {
            cancel::handle_cancel(&self.config, store, &username, query).await
        } else if form::field(query, "username").is_some()
            && form::field(query, "password").is_some()
        {
            password::handle_change(
                &self.config,
                store,
                &username,
                session.is_secured(),
                query,
            )
            .await
        } else {
            Outcome::Rejected(StanzaErrorCondition::BadRequest)
        }
    }
}

/// Whether `to` names an entity this session may not provision.
///
/// Before login a domain-only address or the session's own node is fine.
/// Once authenticated, account operations go to the server alone.
fn misaddressed(to: &Jid, username: &str, authenticated: bool) -> bool {
    if authenticated {
        !to.is_server()
    } else {
        !to.node_str().is_empty() && to.node_str() != username
    }
}

#[async_trait]
impl IqHandler for RegisterModule {
    fn name(&self) -> &'static str {
        "register"
    }

    fn namespaces(&self) -> &'static [&'static str] {
        NAMESPACES
    }

    fn matches_iq(&self, iq: &Iq) -> bool {
        iq.has_payload_ns(ns::REGISTER)
    }

    async fn process_iq(&self, iq: &Iq) -> HandlerResult {
        let session = self.session.as_deref().ok_or(HandlerError::NoSession)?;
        let outcome = self.resolve(iq, session).await;
        crate::metrics::record_registration(outcome.label());
        session.send(outcome.into_reply(iq))?;
        Ok(())
    }
}
