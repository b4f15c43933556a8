//! Addressing helpers on top of [`jid::Jid`].
//!
//! IQ handlers mostly ask two questions of a `to` address: whose account
//! does it name, and is it the server itself.

use jid::Jid;

/// Queries IQ handlers make of a destination address.
pub trait JidExt {
    /// Local part, or the empty string for a domain-only address.
    fn node_str(&self) -> &str;

    /// True for a bare domain such as `jackal.im`.
    fn is_server(&self) -> bool;
}

impl JidExt for Jid {
    fn node_str(&self) -> &str {
        self.node().map_or("", |node| node.as_str())
    }

    fn is_server(&self) -> bool {
        self.node().is_none() && self.resource().is_none()
    }
}
