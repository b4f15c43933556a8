//! Well-known XML namespaces.

/// Client-to-server stanza namespace.
pub const CLIENT: &str = "jabber:client";

/// Stream framing namespace, home of `<stream:error/>`.
pub const STREAM: &str = "http://etherx.jabber.org/streams";

/// RFC 6120 stanza error conditions.
pub const STANZAS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";

/// RFC 6120 stream error conditions.
pub const STREAMS: &str = "urn:ietf:params:xml:ns:xmpp-streams";

/// XEP-0199: XMPP Ping.
pub const PING: &str = "urn:xmpp:ping";

/// XEP-0077: In-Band Registration.
pub const REGISTER: &str = "jabber:iq:register";
