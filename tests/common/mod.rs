//! Integration test common infrastructure.
//!
//! [`TestSession`] wires a [`ChannelSession`], an in-memory account store and
//! a [`Registry`] built from configuration, and offers stanza builders for
//! the exchanges the tests drive.

#![allow(dead_code)]

use stanza_proto::{Element, Iq, IqType, Jid, StanzaErrorCondition, ns};
use stanzad::config::{ModulesConfig, PingConfig, RegistrationConfig};
use stanzad::db::MemoryStore;
use stanzad::handlers::{Dispatch, PingModule, Registry};
use stanzad::session::{ChannelSession, SessionReceiver};
use std::sync::Arc;

/// One session with the standard module set attached.
pub struct TestSession {
    pub session: Arc<ChannelSession>,
    pub rx: SessionReceiver,
    pub store: Arc<MemoryStore>,
    pub registry: Registry,
}

impl TestSession {
    /// Session for `jid` with the given module policy.
    pub fn new(jid: &str, modules: ModulesConfig) -> Self {
        Self::with_store(jid, modules, Arc::new(MemoryStore::new()))
    }

    /// Session sharing an existing store.
    pub fn with_store(jid: &str, modules: ModulesConfig, store: Arc<MemoryStore>) -> Self {
        let jid: Jid = jid.parse().expect("valid test JID");
        let (session, rx) = ChannelSession::new("abcd1234", jid);
        let registry = Registry::from_config(&modules, session.clone(), store.clone());
        Self {
            session,
            rx,
            store,
            registry,
        }
    }

    /// Mark the session authenticated (and optionally secured).
    pub fn login(&self, secured: bool) {
        self.session.set_authenticated(true);
        self.session.set_secured(secured);
    }

    pub fn ping(&self) -> &PingModule {
        self.registry.ping().expect("registry built from config")
    }

    /// Dispatch and return the single reply, if any.
    pub async fn exchange(&mut self, iq: Iq) -> Option<Iq> {
        let dispatch = self.registry.dispatch(&iq).await.expect("dispatch");
        assert_ne!(dispatch, Dispatch::Unhandled, "no module matched {}", iq);
        let reply = self.rx.try_recv();
        assert!(self.rx.try_recv().is_none(), "more than one reply");
        reply
    }

    /// Dispatch and return the error condition of the reply.
    pub async fn expect_error(&mut self, iq: Iq) -> StanzaErrorCondition {
        let reply = self.exchange(iq).await.expect("a reply");
        assert_eq!(reply.iq_type(), IqType::Error, "expected error, got {}", reply);
        reply.error_condition().expect("known condition")
    }

    /// Dispatch and assert an empty result.
    pub async fn expect_result(&mut self, iq: Iq) -> Iq {
        let reply = self.exchange(iq).await.expect("a reply");
        assert_eq!(reply.iq_type(), IqType::Result, "expected result, got {}", reply);
        reply
    }
}

pub fn registration_policy(register: bool, change: bool, cancel: bool) -> ModulesConfig {
    ModulesConfig {
        registration: RegistrationConfig {
            allow_registration: register,
            allow_change: change,
            allow_cancel: cancel,
        },
        ..Default::default()
    }
}

pub fn ping_policy(send: bool, send_interval: u64) -> ModulesConfig {
    ModulesConfig {
        ping: PingConfig {
            send,
            send_interval,
        },
        ..Default::default()
    }
}

/// `<iq type=..><query xmlns="jabber:iq:register">children</query></iq>`
pub fn register_iq(id: &str, ty: IqType, children: Vec<Element>) -> Iq {
    let query = Element::builder("query", ns::REGISTER)
        .append_all(children)
        .build();
    Iq::new(id, ty).with_child(query)
}

/// A registration field, namespaced like the query it goes into.
pub fn field(name: &str, text: &str) -> Element {
    Element::builder(name, ns::REGISTER).append(text).build()
}

pub fn credentials(username: &str, password: &str) -> Vec<Element> {
    vec![field("username", username), field("password", password)]
}

/// `<iq type=..><ping xmlns="urn:xmpp:ping"/></iq>`
pub fn ping_iq(id: &str, ty: IqType) -> Iq {
    Iq::new(id, ty).with_child(Element::builder("ping", ns::PING).build())
}

pub fn jid(s: &str) -> Jid {
    s.parse().expect("valid test JID")
}
