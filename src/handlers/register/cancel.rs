//! Account cancellation (`<remove/>`).

use super::Outcome;
use crate::config::RegistrationConfig;
use crate::db::AccountStore;
use stanza_proto::{Element, StanzaErrorCondition};
use tracing::{error, info};

/// Delete the authenticated user's account.
pub async fn handle_cancel(
    config: &RegistrationConfig,
    store: &dyn AccountStore,
    username: &str,
    query: &Element,
) -> Outcome {
    if !config.allow_cancel {
        return Outcome::Rejected(StanzaErrorCondition::NotAllowed);
    }
    if query.children().count() > 1 {
        return Outcome::Rejected(StanzaErrorCondition::BadRequest);
    }

    if let Err(e) = store.delete_account(username).await {
        error!(username = %username, error = %e, "Account removal failed");
        return Outcome::Rejected(StanzaErrorCondition::InternalServerError);
    }

    info!(username = %username, "Account cancelled");
    Outcome::Cancelled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Account, MemoryStore};
    use stanza_proto::ns;

    fn remove() -> Element {
        Element::builder("query", ns::REGISTER)
            .append(Element::builder("remove", ns::REGISTER).build())
            .build()
    }

    #[tokio::test]
    async fn test_disabled_touches_nothing() {
        let store = MemoryStore::new();
        let outcome =
            handle_cancel(&RegistrationConfig::default(), &store, "ortuman", &remove()).await;
        assert_eq!(outcome, Outcome::Rejected(StanzaErrorCondition::NotAllowed));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_sibling_of_remove() {
        let store = MemoryStore::new();
        let config = RegistrationConfig {
            allow_cancel: true,
            ..Default::default()
        };
        let mut query = remove();
        query.append_child(Element::builder("username", ns::REGISTER).build());
        let outcome = handle_cancel(&config, &store, "ortuman", &query).await;
        assert_eq!(outcome, Outcome::Rejected(StanzaErrorCondition::BadRequest));
    }

    #[tokio::test]
    async fn test_cancel_removes_account() {
        let store = MemoryStore::new();
        store
            .upsert_account(&Account::new("ortuman", "1234"))
            .await
            .unwrap();
        let config = RegistrationConfig {
            allow_cancel: true,
            ..Default::default()
        };

        let outcome = handle_cancel(&config, &store, "ortuman", &remove()).await;
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(store.fetch_account("ortuman").await.unwrap().is_none());
    }
}
