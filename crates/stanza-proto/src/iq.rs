//! Info/Query stanzas.
//!
//! An [`Iq`] is one request/response exchange. Requests are `get` (query)
//! or `set` (submission); every request is answered by exactly one
//! `result` or `error` carrying the same id.
//!
//! # Reference
//! - RFC 6120 Section 8.2.3: IQ Semantics

use std::fmt;
use std::str::FromStr;

use jid::Jid;
use minidom::Element;

use crate::error::{ProtocolError, StanzaErrorCondition};
use crate::{ncname, ns};

/// IQ `type` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IqType {
    /// Query for information.
    Get,
    /// Submission of data.
    Set,
    /// Successful response.
    Result,
    /// Failed response.
    Error,
}

impl IqType {
    /// Wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Result => "result",
            Self::Error => "error",
        }
    }

    /// True for `get` and `set`.
    pub const fn is_request(&self) -> bool {
        matches!(self, Self::Get | Self::Set)
    }

    /// True for `result` and `error`.
    pub const fn is_response(&self) -> bool {
        matches!(self, Self::Result | Self::Error)
    }
}

impl fmt::Display for IqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IqType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Self::Get),
            "set" => Ok(Self::Set),
            "result" => Ok(Self::Result),
            "error" => Ok(Self::Error),
            other => Err(ProtocolError::UnknownIqType(other.to_owned())),
        }
    }
}

/// An IQ stanza.
///
/// Addressing and type are lifted out of the `<iq/>` element; the payload
/// stays as the original [`Element`] children.
#[derive(Clone, Debug, PartialEq)]
pub struct Iq {
    id: String,
    ty: IqType,
    from: Option<Jid>,
    to: Option<Jid>,
    payload: Vec<Element>,
}

impl Iq {
    /// Create an IQ with no addressing and no payload.
    pub fn new(id: impl Into<String>, ty: IqType) -> Self {
        Self {
            id: id.into(),
            ty,
            from: None,
            to: None,
            payload: Vec::new(),
        }
    }

    /// Set the sender.
    pub fn with_from(mut self, from: Jid) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the recipient.
    pub fn with_to(mut self, to: Jid) -> Self {
        self.to = Some(to);
        self
    }

    /// Append a payload element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.payload.push(child);
        self
    }

    /// Stanza id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stanza type.
    pub fn iq_type(&self) -> IqType {
        self.ty
    }

    /// Sender, if addressed.
    pub fn from(&self) -> Option<&Jid> {
        self.from.as_ref()
    }

    /// Recipient, if addressed.
    pub fn to(&self) -> Option<&Jid> {
        self.to.as_ref()
    }

    /// True for `get`.
    pub fn is_get(&self) -> bool {
        self.ty == IqType::Get
    }

    /// True for `set`.
    pub fn is_set(&self) -> bool {
        self.ty == IqType::Set
    }

    /// True for `result`.
    pub fn is_result(&self) -> bool {
        self.ty == IqType::Result
    }

    /// True for `error`.
    pub fn is_error(&self) -> bool {
        self.ty == IqType::Error
    }

    /// Payload elements in document order.
    pub fn payload(&self) -> &[Element] {
        &self.payload
    }

    /// Mutable payload, for callers assembling a request step by step.
    pub fn payload_mut(&mut self) -> &mut Vec<Element> {
        &mut self.payload
    }

    /// First payload element with the given name and namespace.
    pub fn get_child(&self, name: &str, namespace: &str) -> Option<&Element> {
        self.payload.iter().find(|e| e.is(name, namespace))
    }

    /// True when any payload element lives in `namespace`.
    pub fn has_payload_ns(&self, namespace: &str) -> bool {
        self.payload.iter().any(|e| e.ns() == namespace)
    }

    fn reply(&self, ty: IqType) -> Iq {
        Iq {
            id: self.id.clone(),
            ty,
            from: self.to.clone(),
            to: self.from.clone(),
            payload: Vec::new(),
        }
    }

    /// Empty `result` answering this request.
    pub fn result_iq(&self) -> Iq {
        self.reply(IqType::Result)
    }

    /// `result` answering this request and carrying one payload element.
    pub fn result_with(&self, payload: Element) -> Iq {
        self.reply(IqType::Result).with_child(payload)
    }

    /// `error` answering this request.
    ///
    /// The original payload is echoed back ahead of the `<error/>` element,
    /// as RFC 6120 §8.3.1 permits.
    pub fn error_iq(&self, condition: StanzaErrorCondition) -> Iq {
        let mut reply = self.reply(IqType::Error);
        reply.payload = self.payload.clone();
        reply.payload.push(condition.to_element());
        reply
    }

    /// Condition carried by an `error` IQ, if recognised.
    pub fn error_condition(&self) -> Option<StanzaErrorCondition> {
        if !self.is_error() {
            return None;
        }
        self.get_child("error", ns::CLIENT)?
            .children()
            .filter(|c| c.ns() == ns::STANZAS)
            .find_map(|c| c.name().parse().ok())
    }

    /// Render as an `<iq/>` element in the client namespace.
    pub fn to_element(&self) -> Element {
        let mut builder = Element::builder("iq", ns::CLIENT)
            .attr(ncname("id"), self.id.as_str())
            .attr(ncname("type"), self.ty.as_str());
        if let Some(from) = &self.from {
            builder = builder.attr(ncname("from"), from.to_string());
        }
        if let Some(to) = &self.to {
            builder = builder.attr(ncname("to"), to.to_string());
        }
        for child in &self.payload {
            builder = builder.append(child.clone());
        }
        builder.build()
    }
}

impl From<Iq> for Element {
    fn from(iq: Iq) -> Element {
        iq.to_element()
    }
}

impl TryFrom<Element> for Iq {
    type Error = ProtocolError;

    fn try_from(el: Element) -> Result<Self, Self::Error> {
        if !el.is("iq", ns::CLIENT) {
            return Err(ProtocolError::NotAnIq(el.name().to_owned()));
        }
        let id = el.attr("id").ok_or(ProtocolError::MissingAttribute("id"))?;
        let ty = el
            .attr("type")
            .ok_or(ProtocolError::MissingAttribute("type"))?
            .parse()?;
        let from = el.attr("from").map(str::parse::<Jid>).transpose()?;
        let to = el.attr("to").map(str::parse::<Jid>).transpose()?;

        Ok(Iq {
            id: id.to_owned(),
            ty,
            from,
            to,
            payload: el.children().cloned().collect(),
        })
    }
}

impl fmt::Display for Iq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.to_element().write_to(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jid(s: &str) -> Jid {
        s.parse().unwrap()
    }

    fn ping() -> Element {
        Element::builder("ping", ns::PING).build()
    }

    #[test]
    fn test_iq_type_parse() {
        assert_eq!("get".parse::<IqType>().unwrap(), IqType::Get);
        assert_eq!("error".parse::<IqType>().unwrap(), IqType::Error);
        assert!("GET".parse::<IqType>().is_err());
        assert!(IqType::Set.is_request());
        assert!(IqType::Result.is_response());
    }

    #[test]
    fn test_result_swaps_addressing() {
        let iq = Iq::new("abc", IqType::Get)
            .with_from(jid("juliet@capulet.lit/balcony"))
            .with_to(jid("capulet.lit"))
            .with_child(ping());

        let res = iq.result_iq();
        assert_eq!(res.id(), "abc");
        assert!(res.is_result());
        assert_eq!(res.to(), Some(&jid("juliet@capulet.lit/balcony")));
        assert_eq!(res.from(), Some(&jid("capulet.lit")));
        assert!(res.payload().is_empty());
    }

    #[test]
    fn test_error_echoes_payload_and_condition() {
        let query = Element::builder("query", ns::REGISTER).build();
        let iq = Iq::new("e1", IqType::Set).with_child(query);
        let err = iq.error_iq(StanzaErrorCondition::Conflict);

        assert!(err.is_error());
        assert!(err.get_child("query", ns::REGISTER).is_some());
        assert_eq!(err.error_condition(), Some(StanzaErrorCondition::Conflict));
        assert_eq!(
            err.get_child("error", ns::CLIENT).and_then(|e| e.attr("type")),
            Some("cancel")
        );
    }

    #[test]
    fn test_error_condition_absent_on_result() {
        let iq = Iq::new("r", IqType::Get).result_iq();
        assert_eq!(iq.error_condition(), None);
    }

    #[test]
    fn test_element_conversion() {
        let iq = Iq::new("p1", IqType::Get)
            .with_to(jid("romeo@montague.lit/orchard"))
            .with_child(ping());

        let el = iq.to_element();
        assert!(el.is("iq", ns::CLIENT));
        assert_eq!(el.attr("id"), Some("p1"));
        assert_eq!(el.attr("type"), Some("get"));
        assert_eq!(el.attr("to"), Some("romeo@montague.lit/orchard"));
        assert_eq!(el.attr("from"), None);
        assert!(el.get_child("ping", ns::PING).is_some());

        assert_eq!(Iq::try_from(el).unwrap(), iq);
    }

    #[test]
    fn test_rejects_malformed_elements() {
        let message = Element::builder("message", ns::CLIENT).build();
        assert!(matches!(Iq::try_from(message), Err(ProtocolError::NotAnIq(_))));

        let no_id = Element::builder("iq", ns::CLIENT)
            .attr(ncname("type"), "get")
            .build();
        assert!(matches!(
            Iq::try_from(no_id),
            Err(ProtocolError::MissingAttribute("id"))
        ));

        let bad_type = Element::builder("iq", ns::CLIENT)
            .attr(ncname("id"), "x")
            .attr(ncname("type"), "poke")
            .build();
        assert!(matches!(
            Iq::try_from(bad_type),
            Err(ProtocolError::UnknownIqType(_))
        ));

        let bad_to = Element::builder("iq", ns::CLIENT)
            .attr(ncname("id"), "x")
            .attr(ncname("type"), "get")
            .attr(ncname("to"), "@jackal.im")
            .build();
        assert!(matches!(Iq::try_from(bad_to), Err(ProtocolError::InvalidJid(_))));
    }
}
