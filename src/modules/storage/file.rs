use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::{KeyValueStore, StorageError};

/// File-backed store: key `k` lives in `<dir>/k.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys become file names, so no separators or dots
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

/// Write the whole value to `tmp_path`, then move it over `path` so a crash
/// never leaves half a document
fn write_and_replace(tmp_path: &Path, path: &Path, value: &str) -> io::Result<()> {
    let mut file = File::create(tmp_path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()?;
    fs::rename(tmp_path, path)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.entry_path(key)?;
        let tmp_path = path.with_extension("json.tmp");

        if let Err(e) = write_and_replace(&tmp_path, &path, value) {
            if let Err(cleanup_err) = fs::remove_file(&tmp_path) {
                if cleanup_err.kind() != io::ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", tmp_path.display(), cleanup_err);
                }
            }
            return Err(StorageError::Io(e));
        }

        debug!("Stored key {} in {}", key, self.dir.display());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed key {} from {}", key, self.dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
