//! Integration tests for the XEP-0077 in-band registration module.

mod common;

use common::{TestSession, credentials, field, jid, register_iq, registration_policy};
use stanza_proto::{Iq, IqType, StanzaErrorCondition, ns};
use stanzad::db::{Account, AccountStore, MemoryStore};
use std::sync::Arc;

const JID: &str = "ortuman@jackal.im/balcony";

#[tokio::test]
async fn test_invalid_destination() {
    let mut t = TestSession::new(JID, registration_policy(true, true, true));
    t.store
        .upsert_account(&Account::new("ortuman", "1234"))
        .await
        .unwrap();
    let calls = t.store.calls();

    t.session.set_username("romeo");
    let iq = register_iq("r1", IqType::Set, credentials("juliet", "5678"))
        .with_to(jid("ortuman@jackal.im"));
    assert_eq!(t.expect_error(iq).await, StanzaErrorCondition::Forbidden);

    // Once logged in, account operations go to the server, not the account.
    t.session.set_username("ortuman");
    t.login(true);
    for to in ["ortuman@jackal.im", "ortuman@jackal.im/balcony", "romeo@jackal.im"] {
        let iq = register_iq("r2", IqType::Set, vec![field("remove", "")]).with_to(jid(to));
        assert_eq!(t.expect_error(iq).await, StanzaErrorCondition::Forbidden, "{to}");
    }
    let iq = register_iq("r3", IqType::Set, credentials("ortuman", "5678"))
        .with_to(jid("ortuman@jackal.im"));
    assert_eq!(t.expect_error(iq).await, StanzaErrorCondition::Forbidden);

    assert_eq!(t.store.calls(), calls);
    let account = t.store.fetch_account("ortuman").await.unwrap().unwrap();
    assert_eq!(account.password, "1234");
}

#[tokio::test]
async fn test_unauthenticated_own_address_allowed() {
    let mut t = TestSession::new(JID, registration_policy(false, false, false));
    let iq = register_iq("r1", IqType::Get, vec![]).with_to(jid("ortuman@jackal.im"));
    t.expect_result(iq).await;
}

#[tokio::test]
async fn test_unauthenticated_errors() {
    let mut t = TestSession::new(JID, registration_policy(false, false, false));

    let result = register_iq("r1", IqType::Result, vec![]);
    assert_eq!(t.expect_error(result).await, StanzaErrorCondition::BadRequest);

    let no_query = Iq::new("r2", IqType::Get)
        .with_child(stanza_proto::Element::builder("x", ns::REGISTER).build());
    assert_eq!(t.expect_error(no_query).await, StanzaErrorCondition::BadRequest);

    let extra = register_iq("r3", IqType::Get, vec![field("q2", "")]);
    assert_eq!(t.expect_error(extra).await, StanzaErrorCondition::BadRequest);
}

#[tokio::test]
async fn test_discovery_form_regardless_of_policy() {
    for (register, change, cancel) in [
        (false, false, false),
        (true, false, false),
        (false, true, true),
        (true, true, true),
    ] {
        let mut t = TestSession::new(JID, registration_policy(register, change, cancel));
        let iq = register_iq("form", IqType::Get, vec![]).with_to(jid("jackal.im"));
        let reply = t.expect_result(iq).await;

        let query = reply.get_child("query", ns::REGISTER).expect("form");
        assert!(query.get_child("username", ns::REGISTER).is_some());
        assert!(query.get_child("password", ns::REGISTER).is_some());
        assert_eq!(query.children().count(), 2);
        assert_eq!(t.store.calls(), 0);
    }
}

#[tokio::test]
async fn test_registration_disabled_never_touches_storage() {
    let mut t = TestSession::new(JID, registration_policy(false, true, true));
    for (i, children) in [
        credentials("juliet", "5678"),
        credentials("", ""),
        vec![field("remove", "")],
        vec![],
    ]
    .into_iter()
    .enumerate()
    {
        let iq = register_iq(&format!("r{i}"), IqType::Set, children);
        assert_eq!(t.expect_error(iq).await, StanzaErrorCondition::NotAllowed);
    }
    assert_eq!(t.store.calls(), 0);
}

#[tokio::test]
async fn test_register_user() {
    let mut t = TestSession::new(JID, registration_policy(true, false, false));
    let server = jid("jackal.im");

    // empty fields
    let iq = register_iq("r1", IqType::Set, credentials("", "")).with_to(server.clone());
    assert_eq!(t.expect_error(iq).await, StanzaErrorCondition::BadRequest);

    // unexpected field
    let mut children = credentials("juliet", "5678");
    children.push(field("email", "juliet@capulet.lit"));
    let iq = register_iq("r2", IqType::Set, children);
    assert_eq!(t.expect_error(iq).await, StanzaErrorCondition::BadRequest);

    // already existing user
    t.store
        .upsert_account(&Account::new("ortuman", "1234"))
        .await
        .unwrap();
    let iq = register_iq("r3", IqType::Set, credentials("ortuman", "5678")).with_to(server.clone());
    assert_eq!(t.expect_error(iq).await, StanzaErrorCondition::Conflict);
    let existing = t.store.fetch_account("ortuman").await.unwrap().unwrap();
    assert_eq!(existing.password, "1234");

    // storage error
    t.store.set_failing(true);
    let iq = register_iq("r4", IqType::Set, credentials("juliet", "5678"));
    assert_eq!(
        t.expect_error(iq).await,
        StanzaErrorCondition::InternalServerError
    );
    t.store.set_failing(false);

    let iq = register_iq("r5", IqType::Set, credentials("juliet", "5678")).with_to(server);
    t.expect_result(iq).await;

    let juliet = t.store.fetch_account("juliet").await.unwrap().unwrap();
    assert_eq!(juliet.password, "5678");

    // one registration per session
    let iq = register_iq("r6", IqType::Set, credentials("romeo", "abcd"));
    assert_eq!(t.expect_error(iq).await, StanzaErrorCondition::NotAcceptable);
    assert!(t.store.fetch_account("romeo").await.unwrap().is_none());
}

#[tokio::test]
async fn test_register_on_sqlite() {
    let store = stanzad::db::Database::new(":memory:").await.unwrap();
    let store = Arc::new(store);
    let jid_value = jid(JID);
    let (session, mut rx) = stanzad::session::ChannelSession::new("abcd1234", jid_value);
    let registry = stanzad::handlers::Registry::from_config(
        &registration_policy(true, false, false),
        session,
        store.clone(),
    );

    let iq = register_iq("r1", IqType::Set, credentials("juliet", "5678"));
    registry.dispatch(&iq).await.unwrap();
    assert_eq!(rx.try_recv().unwrap().iq_type(), IqType::Result);

    let juliet = store.fetch_account("juliet").await.unwrap().unwrap();
    assert_eq!(juliet.password, "5678");
}

#[tokio::test]
async fn test_authenticated_errors() {
    let mut t = TestSession::new(JID, registration_policy(true, true, true));
    t.login(true);

    let result = register_iq("r1", IqType::Result, vec![]).with_to(jid("jackal.im"));
    assert_eq!(t.expect_error(result).await, StanzaErrorCondition::BadRequest);

    let get = register_iq("r2", IqType::Get, vec![]);
    assert_eq!(t.expect_error(get).await, StanzaErrorCondition::BadRequest);

    let empty = register_iq("r3", IqType::Set, vec![]);
    assert_eq!(t.expect_error(empty).await, StanzaErrorCondition::BadRequest);

    let only_username = register_iq("r4", IqType::Set, vec![field("username", "ortuman")]);
    assert_eq!(
        t.expect_error(only_username).await,
        StanzaErrorCondition::BadRequest
    );
    assert_eq!(t.store.calls(), 0);
}

#[tokio::test]
async fn test_cancel_registration() {
    let store = Arc::new(MemoryStore::new());
    store
        .upsert_account(&Account::new("ortuman", "1234"))
        .await
        .unwrap();

    let mut t = TestSession::with_store(JID, registration_policy(false, false, false), store.clone());
    t.login(false);
    let remove = || register_iq("c1", IqType::Set, vec![field("remove", "")]).with_to(jid("jackal.im"));

    assert_eq!(t.expect_error(remove()).await, StanzaErrorCondition::NotAllowed);

    let mut t = TestSession::with_store(JID, registration_policy(false, false, true), store.clone());
    t.login(false);

    let extra = register_iq(
        "c2",
        IqType::Set,
        vec![field("remove", ""), field("remove2", "")],
    );
    assert_eq!(t.expect_error(extra).await, StanzaErrorCondition::BadRequest);

    store.set_failing(true);
    assert_eq!(
        t.expect_error(remove()).await,
        StanzaErrorCondition::InternalServerError
    );
    store.set_failing(false);

    t.expect_result(remove()).await;
    assert!(store.fetch_account("ortuman").await.unwrap().is_none());
}

#[tokio::test]
async fn test_change_password() {
    let store = Arc::new(MemoryStore::new());
    store
        .upsert_account(&Account::new("ortuman", "1234"))
        .await
        .unwrap();

    let mut t = TestSession::with_store(JID, registration_policy(false, false, false), store.clone());
    t.login(false);
    let change = |username: &str| {
        register_iq("p1", IqType::Set, credentials(username, "5678")).with_to(jid("jackal.im"))
    };

    assert_eq!(
        t.expect_error(change("juliet")).await,
        StanzaErrorCondition::NotAllowed
    );

    let mut t = TestSession::with_store(JID, registration_policy(false, true, false), store.clone());
    t.login(false);

    assert_eq!(
        t.expect_error(change("juliet")).await,
        StanzaErrorCondition::NotAllowed
    );
    assert_eq!(
        t.expect_error(change("ortuman")).await,
        StanzaErrorCondition::NotAuthorized
    );

    t.session.set_secured(true);

    store.set_failing(true);
    assert_eq!(
        t.expect_error(change("ortuman")).await,
        StanzaErrorCondition::InternalServerError
    );
    store.set_failing(false);

    t.expect_result(change("ortuman")).await;
    t.expect_result(change("ortuman")).await;

    let account = store.fetch_account("ortuman").await.unwrap().unwrap();
    assert_eq!(account.password, "5678");
}
