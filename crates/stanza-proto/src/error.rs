//! Error types for the stanza protocol library.
//!
//! This module defines the library's own [`ProtocolError`] as well as the
//! RFC 6120 error *conditions* that travel on the wire: stanza-level
//! conditions ([`StanzaErrorCondition`]) answered to a single request and
//! stream-level conditions ([`StreamErrorCondition`]) that end a session.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use minidom::Element;

use crate::{ncname, ns};

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// A `from` or `to` address could not be parsed.
    #[error("invalid jid: {0}")]
    InvalidJid(#[from] jid::Error),

    /// The element is not an `<iq/>` in the client namespace.
    #[error("expected iq, found <{0}>")]
    NotAnIq(String),

    /// A required attribute is absent.
    #[error("missing attribute: {0}")]
    MissingAttribute(&'static str),

    /// IQ `type` attribute is not one of get/set/result/error.
    #[error("unknown iq type: {0}")]
    UnknownIqType(String),

    /// Unknown stanza or stream error condition name.
    #[error("unknown error condition: {0}")]
    UnknownCondition(String),
}

/// The `type` attribute of an `<error/>` element (RFC 6120 §8.3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Retry after providing credentials.
    Auth,
    /// Do not retry (unrecoverable).
    Cancel,
    /// Proceed (the condition was only a warning).
    Continue,
    /// Retry after changing the data sent.
    Modify,
    /// Retry after waiting (temporary).
    Wait,
}

impl ErrorType {
    /// Wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Cancel => "cancel",
            Self::Continue => "continue",
            Self::Modify => "modify",
            Self::Wait => "wait",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stanza-level error conditions (RFC 6120 §8.3.3).
///
/// Only the conditions a server-side IQ handler actually emits are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StanzaErrorCondition {
    /// Malformed request: wrong addressee shape, unexpected or missing children.
    BadRequest,
    /// The resource already exists (e.g. registering a taken username).
    Conflict,
    /// The feature is not implemented by the recipient.
    FeatureNotImplemented,
    /// The requester lacks permission for the addressed entity.
    Forbidden,
    /// Backend failure on the server side.
    InternalServerError,
    /// The request does not meet a criterion the recipient enforces.
    NotAcceptable,
    /// Disabled by policy.
    NotAllowed,
    /// Credentials or channel security are insufficient.
    NotAuthorized,
    /// No handler serves the request.
    ServiceUnavailable,
}

impl StanzaErrorCondition {
    /// Every modelled condition, in wire-name order.
    pub const ALL: [StanzaErrorCondition; 9] = [
        Self::BadRequest,
        Self::Conflict,
        Self::FeatureNotImplemented,
        Self::Forbidden,
        Self::InternalServerError,
        Self::NotAcceptable,
        Self::NotAllowed,
        Self::NotAuthorized,
        Self::ServiceUnavailable,
    ];

    /// Element name used on the wire.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad-request",
            Self::Conflict => "conflict",
            Self::FeatureNotImplemented => "feature-not-implemented",
            Self::Forbidden => "forbidden",
            Self::InternalServerError => "internal-server-error",
            Self::NotAcceptable => "not-acceptable",
            Self::NotAllowed => "not-allowed",
            Self::NotAuthorized => "not-authorized",
            Self::ServiceUnavailable => "service-unavailable",
        }
    }

    /// Default error type recommended by RFC 6120 for this condition.
    pub const fn error_type(&self) -> ErrorType {
        match self {
            Self::BadRequest | Self::NotAcceptable => ErrorType::Modify,
            Self::Forbidden | Self::NotAuthorized => ErrorType::Auth,
            Self::InternalServerError => ErrorType::Wait,
            Self::Conflict
            | Self::FeatureNotImplemented
            | Self::NotAllowed
            | Self::ServiceUnavailable => ErrorType::Cancel,
        }
    }

    /// Build the `<error type=".."><condition xmlns=stanzas/></error>` element.
    pub fn to_element(&self) -> Element {
        Element::builder("error", ns::CLIENT)
            .attr(ncname("type"), self.error_type().as_str())
            .append(Element::builder(self.name(), ns::STANZAS).build())
            .build()
    }
}

impl fmt::Display for StanzaErrorCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StanzaErrorCondition {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| ProtocolError::UnknownCondition(s.to_owned()))
    }
}

/// Stream-level error conditions (RFC 6120 §4.9.3). Sending one ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamErrorCondition {
    /// The peer stopped answering keepalive probes.
    ConnectionTimeout,
    /// Internal failure on the server side.
    InternalServerError,
    /// The peer attempted something before authenticating.
    NotAuthorized,
    /// The peer violated a local service policy.
    PolicyViolation,
    /// The server is shutting down.
    SystemShutdown,
}

impl StreamErrorCondition {
    /// Element name used on the wire.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ConnectionTimeout => "connection-timeout",
            Self::InternalServerError => "internal-server-error",
            Self::NotAuthorized => "not-authorized",
            Self::PolicyViolation => "policy-violation",
            Self::SystemShutdown => "system-shutdown",
        }
    }

    /// Build the `<stream:error>` element carrying this condition.
    pub fn to_element(&self) -> Element {
        Element::builder("error", ns::STREAM)
            .append(Element::builder(self.name(), ns::STREAMS).build())
            .build()
    }
}

impl fmt::Display for StreamErrorCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_names_parse_back() {
        for cond in StanzaErrorCondition::ALL {
            assert_eq!(cond.name().parse::<StanzaErrorCondition>().unwrap(), cond);
        }
        assert!(matches!(
            "no-such-thing".parse::<StanzaErrorCondition>(),
            Err(ProtocolError::UnknownCondition(name)) if name == "no-such-thing"
        ));
    }

    #[test]
    fn test_condition_error_types() {
        assert_eq!(StanzaErrorCondition::BadRequest.error_type(), ErrorType::Modify);
        assert_eq!(StanzaErrorCondition::Forbidden.error_type(), ErrorType::Auth);
        assert_eq!(StanzaErrorCondition::NotAuthorized.error_type(), ErrorType::Auth);
        assert_eq!(StanzaErrorCondition::Conflict.error_type(), ErrorType::Cancel);
        assert_eq!(StanzaErrorCondition::InternalServerError.error_type(), ErrorType::Wait);
    }

    #[test]
    fn test_error_element_shape() {
        let el = StanzaErrorCondition::NotAllowed.to_element();
        assert!(el.is("error", ns::CLIENT));
        assert_eq!(el.attr("type"), Some("cancel"));
        assert!(el.get_child("not-allowed", ns::STANZAS).is_some());
    }

    #[test]
    fn test_stream_error_element() {
        let el = StreamErrorCondition::ConnectionTimeout.to_element();
        assert!(el.is("error", ns::STREAM));
        assert!(el.get_child("connection-timeout", ns::STREAMS).is_some());
        assert_eq!(StreamErrorCondition::ConnectionTimeout.to_string(), "connection-timeout");
    }
}
