//! IQ extension modules.
//!
//! Each module implements [`IqHandler`] and is attached to one session. The
//! [`Registry`] offers every inbound IQ to its modules in order; the first
//! whose `matches_iq` returns true processes it.
//!
//! - [`PingModule`]: XEP-0199 keepalive (`urn:xmpp:ping`)
//! - [`RegisterModule`]: XEP-0077 in-band registration (`jabber:iq:register`)

pub mod core;
pub mod ping;
pub mod register;

pub use self::core::{Dispatch, IqHandler, Registry};
pub use ping::PingModule;
pub use register::{Outcome, RegisterModule};
