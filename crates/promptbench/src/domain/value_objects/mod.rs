//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod provider;
mod update;

pub use provider::*;
pub use update::*;
