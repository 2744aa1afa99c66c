//! Domain Entities
//!
//! - ModelConfig: a completion backend and the prompts it owns
//! - Prompt: a system/user pair with its last output
//! - Variable: a `{name}` substitution value
//! - Saved*: named snapshots kept in the snapshot library

mod model_config;
mod prompt;
mod snapshot;
mod variable;

pub use model_config::*;
pub use prompt::*;
pub use snapshot::*;
pub use variable::*;
