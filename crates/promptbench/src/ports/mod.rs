//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the workbench
//! interacts with external systems (completion services, storage).
//!
//! Implementations of these traits live in `adapters`.

pub mod repositories;
pub mod services;

// Re-exports
pub use repositories::*;
pub use services::*;
