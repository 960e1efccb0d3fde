//! Durable key-value storage.
//!
//! The collection store persists through [`KeyValueStore`]: string values
//! under string keys, each write replacing the whole value. Two backends are
//! provided, a directory of JSON files and an in-process map.

mod atomic;
mod file;
mod memory;

pub use atomic::{read_string, write_string};
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::Result;

/// Key-value store scoped to one user profile.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` if never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the value under `key`. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> Result<()>;
}
