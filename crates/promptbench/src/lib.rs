//! Promptbench Library
//!
//! Compose system/user prompt pairs with `{variable}` substitution, run them
//! against several model configurations, and keep reusable prompts, models
//! and variable sets in a local key-value store.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain/`): entities, value objects and errors
//!   - `entities/`: ModelConfig, Prompt, Variable, saved snapshots
//!   - `value_objects/`: Provider, field updates
//! - **Ports** (`ports/`): traits for completion providers and storage
//! - **Services** (`services/`): template substitution and dispatch
//! - **Adapters** (`adapters/`): OpenAI-style HTTP client, file and memory stores
//! - **Application** (`application/`): Workbench and SnapshotLibrary
//!
//! # Usage
//!
//! ```rust,ignore
//! use promptbench::{FileStore, ProviderRegistry, SnapshotLibrary, Workbench};
//!
//! let mut bench = Workbench::default();
//! let library = SnapshotLibrary::open(FileStore::open("data")?)?;
//! let reports = bench.run_all(&ProviderRegistry::default()).await;
//! ```

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use adapters::{FileStore, MemoryStore, OpenAiClient};
pub use application::{RunReport, SnapshotLibrary, Workbench};
pub use domain::{
    DomainError, ModelConfig, ModelDefaults, ModelSnapshot, ModelUpdate, Prompt, PromptContent,
    PromptField, Provider, SavedModel, SavedPrompt, SavedVariableSet, Variable, VariableField,
};
pub use ports::{ChatMessage, CompletionProvider, CompletionRequest, KeyValueStore, MessageRole};
pub use services::{substitute, DispatchOutcome, PendingDispatch, ProviderRegistry};
