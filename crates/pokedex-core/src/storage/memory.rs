use super::KeyValueStore;
use crate::{PokedexError, Result};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-process [`KeyValueStore`]. Contents live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned(key: &str) -> PokedexError {
        PokedexError::Storage {
            key: key.to_string(),
            message: "memory store lock poisoned".to_string(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned(key))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned(key))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned(key))?;
        entries.remove(key);
        Ok(())
    }
}
