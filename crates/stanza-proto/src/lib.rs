//! # stanza-proto
//!
//! Stanza data model for XMPP-style request/response (IQ) exchanges.
//!
//! ## Features
//!
//! - [`Iq`] stanzas with `result`/`error` response builders, converted to
//!   and from [`minidom::Element`] trees
//! - [`Jid`] addressing from the `jid` crate, plus [`JidExt`] queries
//! - RFC 6120 stanza and stream error conditions
//!
//! ## Quick Start
//!
//! ```rust
//! use stanza_proto::{Element, Iq, IqType, Jid, StanzaErrorCondition, ns};
//!
//! let jid: Jid = "juliet@capulet.lit/balcony".parse().expect("valid JID");
//! let iq = Iq::new("c2s1", IqType::Get)
//!     .with_from(jid.clone())
//!     .with_to(jid.to_bare().into())
//!     .with_child(Element::builder("ping", ns::PING).build());
//!
//! let reply = iq.error_iq(StanzaErrorCondition::Forbidden);
//! assert_eq!(reply.error_condition(), Some(StanzaErrorCondition::Forbidden));
//! assert_eq!(reply.to(), Some(&jid));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod address;
pub mod error;
pub mod iq;
pub mod ns;

pub use jid::{BareJid, FullJid, Jid};
pub use minidom::Element;

pub use self::address::JidExt;
pub use self::error::{ErrorType, ProtocolError, StanzaErrorCondition, StreamErrorCondition};
pub use self::iq::{Iq, IqType};

use minidom::rxml::NcName;

/// Attribute name for minidom's builder API.
///
/// Only called with the fixed names stanzas carry (`id`, `type`, `from`, `to`).
pub(crate) fn ncname(s: &str) -> NcName {
    NcName::try_from(s).unwrap_or_else(|_| panic!("invalid NCName: {s}"))
}
