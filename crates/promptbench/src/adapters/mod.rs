//! Adapters
//!
//! Concrete implementations of the ports: the OpenAI-style HTTP client and
//! the key-value stores.

mod file_store;
mod memory_store;
mod openai;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use openai::OpenAiClient;
