//! Core IQ handler infrastructure: the module contract and the registry
//! that dispatches to it.

pub mod registry;
pub mod traits;

pub use registry::{Dispatch, Registry};
pub use traits::IqHandler;
