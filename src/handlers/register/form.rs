//! The `jabber:iq:register` query payload.

use stanza_proto::{Element, ns};

/// Field names the registration form advertises and accepts.
pub const FIELDS: [&str; 2] = ["username", "password"];

/// The discovery form: `<query xmlns="jabber:iq:register"><username/><password/></query>`.
pub fn discovery_form() -> Element {
    FIELDS
        .iter()
        .fold(Element::builder("query", ns::REGISTER), |query, name| {
            query.append(Element::builder(*name, ns::REGISTER).build())
        })
        .build()
}

/// A submitted username/password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Trimmed username.
    pub username: String,
    /// Password as submitted.
    pub password: String,
}

/// A named child of the query. Fields inherit the query's namespace.
pub(super) fn field<'a>(query: &'a Element, name: &str) -> Option<&'a Element> {
    query.get_child(name, ns::REGISTER)
}

/// Parse a registration submission.
///
/// The query must hold exactly one `username` and one `password` element,
/// nothing else, and neither may be blank.
pub fn parse_credentials(query: &Element) -> Option<Credentials> {
    if query.children().count() != FIELDS.len() {
        return None;
    }
    let username = field(query, "username")?.text();
    let password = field(query, "password")?.text();
    let username = username.trim();
    if username.is_empty() || password.trim().is_empty() {
        return None;
    }
    Some(Credentials {
        username: username.to_string(),
        password,
    })
}

/// Whether the query asks for account removal.
pub fn is_removal(query: &Element) -> bool {
    field(query, "remove").is_some()
}
