//! File-backed key-value store
//!
//! Each key maps to one file inside the store directory. Writes go to a
//! sibling temp file which is then renamed over the target, so readers see
//! either the old value or the new one.

use super::PersistentKV;
use crate::error::{RateCacheError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

// Keys never start with '.', so temp names cannot collide with a key.
const TMP_PREFIX: &str = ".";
const TMP_SUFFIX: &str = ".tmp";

/// Store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            RateCacheError::Storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(RateCacheError::Storage(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(key))
    }
}

impl PersistentKV for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RateCacheError::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!("{}{}{}", TMP_PREFIX, key, TMP_SUFFIX));

        fs::write(&tmp, value).map_err(|e| {
            RateCacheError::Storage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            RateCacheError::Storage(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        log::debug!("Stored {} ({} bytes)", path.display(), value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
