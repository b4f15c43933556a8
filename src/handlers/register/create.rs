//! Requests from sessions that have not authenticated yet: discovery and
//! account creation.

use super::Outcome;
use super::form::{discovery_form, parse_credentials};
use crate::config::RegistrationConfig;
use crate::db::{Account, AccountStore};
use stanza_proto::{Element, IqType, StanzaErrorCondition};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

/// Handle a provisioning IQ on an unauthenticated session.
pub async fn handle_unauthenticated(
    config: &RegistrationConfig,
    store: &dyn AccountStore,
    registered: &AtomicBool,
    ty: IqType,
    query: Option<&Element>,
) -> Outcome {
    match ty {
        IqType::Get => handle_discovery(query),
        IqType::Set => handle_create(config, store, registered, query).await,
        IqType::Result | IqType::Error => Outcome::Rejected(StanzaErrorCondition::BadRequest),
    }
}

/// Answer a form request. Policy plays no part here.
fn handle_discovery(query: Option<&Element>) -> Outcome {
    match query {
        Some(query) if query.children().next().is_none() => Outcome::Form(discovery_form()),
        _ => Outcome::Rejected(StanzaErrorCondition::BadRequest),
    }
}

async fn handle_create(
    config: &RegistrationConfig,
    store: &dyn AccountStore,
    registered: &AtomicBool,
    query: Option<&Element>,
) -> Outcome {
    if !config.allow_registration {
        return Outcome::Rejected(StanzaErrorCondition::NotAllowed);
    }
    if registered.load(Ordering::Acquire) {
        return Outcome::Rejected(StanzaErrorCondition::NotAcceptable);
    }
    let Some(creds) = query.and_then(parse_credentials) else {
        return Outcome::Rejected(StanzaErrorCondition::BadRequest);
    };

    match store.fetch_account(&creds.username).await {
        Ok(Some(_)) => return Outcome::Rejected(StanzaErrorCondition::Conflict),
        Ok(None) => {}
        Err(e) => {
            error!(username = %creds.username, error = %e, "Account lookup failed");
            return Outcome::Rejected(StanzaErrorCondition::InternalServerError);
        }
    }

    let account = Account::new(creds.username, creds.password);
    if let Err(e) = store.upsert_account(&account).await {
        error!(username = %account.username, error = %e, "Account creation failed");
        return Outcome::Rejected(StanzaErrorCondition::InternalServerError);
    }

    registered.store(true, Ordering::Release);
    info!(username = %account.username, "Account registered");
    Outcome::Registered
}
