//! Password change for an authenticated session.

use super::Outcome;
use super::form::field;
use crate::config::RegistrationConfig;
use crate::db::{Account, AccountStore};
use stanza_proto::{Element, StanzaErrorCondition};
use tracing::{error, info};

/// Replace the stored password of the session's own account.
///
/// `query` holds both `username` and `password`.
pub async fn handle_change(
    config: &RegistrationConfig,
    store: &dyn AccountStore,
    username: &str,
    secured: bool,
    query: &Element,
) -> Outcome {
    if !config.allow_change {
        return Outcome::Rejected(StanzaErrorCondition::NotAllowed);
    }
    let submitted = field(query, "username").map(Element::text).unwrap_or_default();
    if submitted.trim() != username {
        return Outcome::Rejected(StanzaErrorCondition::NotAllowed);
    }
    if !secured {
        return Outcome::Rejected(StanzaErrorCondition::NotAuthorized);
    }
    let password = field(query, "password").map(Element::text).unwrap_or_default();
    if password.trim().is_empty() {
        return Outcome::Rejected(StanzaErrorCondition::BadRequest);
    }

    let account = Account::new(username, password);
    if let Err(e) = store.upsert_account(&account).await {
        error!(username = %username, error = %e, "Password change failed");
        return Outcome::Rejected(StanzaErrorCondition::InternalServerError);
    }

    info!(username = %username, "Password changed");
    Outcome::PasswordChanged
}
