//! The IQ module contract.
//!
//! Every extension module implements [`IqHandler`]. The [`Registry`]
//! (see `registry.rs`) holds modules in registration order and hands each
//! inbound IQ to the first one whose [`IqHandler::matches_iq`] returns true.
//!
//! ## Contract
//!
//! - `matches_iq` is a pure predicate. It is called for every module on
//!   every IQ, so it must not block or mutate state.
//! - `process_iq` sends exactly one response for every IQ it accepts, with
//!   one documented exception: the keepalive module's acknowledgment path
//!   sends nothing.
//! - Stanza-level failures are sent to the peer as error IQs and the call
//!   returns `Ok(())`. `Err` means the response could not be delivered.
//!
//! [`Registry`]: super::Registry

use crate::error::HandlerResult;
use async_trait::async_trait;
use stanza_proto::Iq;

/// An IQ extension module.
///
/// # Example
///
/// ```ignore
/// pub struct VersionModule { session: Arc<dyn Session> }
///
/// #[async_trait]
/// impl IqHandler for VersionModule {
///     fn name(&self) -> &'static str { "version" }
///     fn namespaces(&self) -> &'static [&'static str] { &["jabber:iq:version"] }
///
///     fn matches_iq(&self, iq: &Iq) -> bool {
///         iq.get_child("query", "jabber:iq:version").is_some()
///     }
///
///     async fn process_iq(&self, iq: &Iq) -> HandlerResult {
///         self.session.send(iq.result_iq())?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait IqHandler: Send + Sync {
    /// Short module name, used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Protocol namespaces this module claims, for service discovery.
    fn namespaces(&self) -> &'static [&'static str];

    /// Whether this module should process `iq`.
    fn matches_iq(&self, iq: &Iq) -> bool;

    /// Process a matched IQ.
    async fn process_iq(&self, iq: &Iq) -> HandlerResult;

    /// Release timers and background tasks. Idempotent.
    fn shutdown(&self) {}
}
