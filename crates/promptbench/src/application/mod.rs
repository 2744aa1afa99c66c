//! Application Layer
//!
//! Stateful use cases over the domain: the live workbench and the saved
//! snapshot library.

mod library;
mod workbench;

pub use library::{SnapshotLibrary, SAVED_MODELS_KEY, SAVED_PROMPTS_KEY, SAVED_VARIABLES_KEY};
pub use workbench::{RunReport, Workbench};
