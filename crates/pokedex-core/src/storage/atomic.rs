//! Atomic whole-file writes.
//!
//! A write goes to a temp file with a PID+TID suffix, is synced to disk and
//! then renamed over the target, so readers see either the old or the new
//! contents and never a torn file.

use crate::{PokedexError, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use tracing::debug;

/// Read a whole file as UTF-8. Returns `None` if it doesn't exist.
pub fn read_string(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PokedexError::Io {
            message: format!("Failed to read {}", path.display()),
            path: Some(path.to_path_buf()),
            source: Some(e),
        }),
    }
}

/// Replace the contents of `path` atomically.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PokedexError::Io {
            message: format!("Failed to create directory {}", parent.display()),
            path: Some(parent.to_path_buf()),
            source: Some(e),
        })?;
    }

    let temp_path = temp_path_for(path);

    let written = (|| -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        file.sync_all()
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(PokedexError::Io {
            message: format!("Failed to write temp file {}", temp_path.display()),
            path: Some(temp_path),
            source: Some(e),
        });
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        PokedexError::Io {
            message: format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            ),
            path: Some(path.to_path_buf()),
            source: Some(e),
        }
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name,
        process::id(),
        thread_id()
    ))
}

/// Numeric identifier for the current thread.
fn thread_id() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    thread::current().id().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pokemon_collection.json");

        write_string(&path, "[]").unwrap();
        assert_eq!(read_string(&path).unwrap().as_deref(), Some("[]"));

        write_string(&path, r#"[{"id":1}]"#).unwrap();
        assert_eq!(read_string(&path).unwrap().as_deref(), Some(r#"[{"id":1}]"#));
    }

    #[test]
    fn test_read_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_string(&temp_dir.path().join("absent.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_write_creates_directories_and_leaves_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.json");

        write_string(&path, "{}").unwrap();
        assert!(path.exists());

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
