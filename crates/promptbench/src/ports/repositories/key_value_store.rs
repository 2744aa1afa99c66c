//! Key-Value Store Port
//!
//! Abstract interface for the persistent string storage behind the
//! snapshot library. Reads and writes are synchronous.

use crate::domain::errors::DomainError;

/// Repository interface for string values stored under fixed keys
pub trait KeyValueStore: Send + Sync {
    /// Read the value under a key, `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Write (or overwrite) the value under a key
    fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;
}
