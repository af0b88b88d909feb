//! File-backed cart storage.
//!
//! One JSON file per storage key under a directory: `<dir>/<key>.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use shopfront_core::{CartStorage, StorageError, StorageKey};

/// [`CartStorage`] that keeps each key in its own file.
///
/// A missing file reads as "nothing stored". Writes go to a temporary file
/// that is then renamed over the target, so a crash mid-write never leaves a
/// truncated snapshot behind.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    dir: PathBuf,
}

impl FileCartStorage {
    /// Store carts under `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File a key is stored in.
    ///
    /// Characters outside `[A-Za-z0-9_-]` are replaced so a key can never
    /// address a path outside the directory.
    #[must_use]
    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        let name: String = key
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

fn io_error(path: &Path, e: &std::io::Error) -> StorageError {
    StorageError::Backend(format!("{}: {e}", path.display()))
}

impl CartStorage for FileCartStorage {
    async fn load(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, &e)),
        }
    }

    async fn save(&self, key: &StorageKey, value: String) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::Unavailable(format!("{}: {e}", self.dir.display())))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| io_error(&tmp, &e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, &e))
    }
}
