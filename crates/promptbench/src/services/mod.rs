//! Domain Services
//!
//! Stateless logic shared by the workbench: template substitution and
//! completion dispatch.

pub mod dispatch;
pub mod template;

pub use dispatch::{
    build_request, error_output, DispatchOutcome, PendingDispatch, ProviderRegistry,
};
pub use template::{substitute, substitute_pair};
