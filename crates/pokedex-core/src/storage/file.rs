//! Directory-backed store: one `<key>.json` file per key.

use super::atomic::{read_string, write_string};
use super::KeyValueStore;
use crate::{PokedexError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// [`KeyValueStore`] writing each key to its own file under `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PokedexError::Storage {
                key: key.to_string(),
                message: "keys may only contain ASCII letters, digits, '_' and '-'".to_string(),
            });
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        read_string(&self.path_for(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        write_string(&self.path_for(key)?, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PokedexError::io_with_path(e, path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("data"));

        assert!(store.get("pokemon_collection").unwrap().is_none());

        store.set("pokemon_collection", "[]").unwrap();
        assert_eq!(
            store.get("pokemon_collection").unwrap().as_deref(),
            Some("[]")
        );
        assert!(temp_dir
            .path()
            .join("data")
            .join("pokemon_collection.json")
            .exists());

        store.remove("pokemon_collection").unwrap();
        store.remove("pokemon_collection").unwrap();
        assert!(store.get("pokemon_collection").unwrap().is_none());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let store = FileStore::new("/tmp/pokedex-test");
        assert!(store.path_for("../escape").is_err());
        assert!(store.path_for("").is_err());
        assert!(store.path_for("pokemon_collection").is_ok());
    }
}
