//! Repository Ports
//!
//! Abstract interfaces for persistent storage.

mod key_value_store;

pub use key_value_store::*;
