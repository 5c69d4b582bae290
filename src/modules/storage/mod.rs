//! Durable key-value storage backing the session store.
//!
//! Values are opaque strings (JSON in practice). Three backends:
//! - `MemoryStore`: process-local map, used by tests and embedders
//! - `FileStore`: one file per key inside a data directory
//! - `EncryptedStore`: seals every value of another store with AES-256-GCM

pub mod encrypted;
pub mod errors;
pub mod file;
pub mod memory;

pub use encrypted::EncryptedStore;
pub use errors::StorageError;
pub use file::FileStore;
pub use memory::MemoryStore;

use log::info;

use crate::modules::config::AppConfig;

/// Minimal string key-value contract.
///
/// `remove` on a missing key is not an error.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Open the store described by `config`: a `FileStore` in `data_dir`, wrapped
/// in an `EncryptedStore` when `encrypt_store` is set.
pub fn open_configured_store(
    config: &AppConfig,
    passphrase: Option<&str>,
) -> Result<Box<dyn KeyValueStore + Send>, StorageError> {
    let files = FileStore::open(&config.data_dir)?;
    if !config.encrypt_store {
        return Ok(Box::new(files));
    }

    let passphrase = passphrase.ok_or_else(|| {
        StorageError::Encryption("store encryption is enabled but no passphrase was given".to_string())
    })?;
    info!("Opening encrypted store in {}", config.data_dir.display());
    let encrypted = EncryptedStore::open(files, passphrase, config.session.hash_iterations)?;
    Ok(Box::new(encrypted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &std::path::Path, encrypt_store: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config.data_dir = dir.to_path_buf();
        config.encrypt_store = encrypt_store;
        config.session.hash_iterations = 1_000;
        config
    }

    #[test]
    fn test_plain_store_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_configured_store(&config_in(temp_dir.path(), false), None).unwrap();
        store.set("user", "{}").unwrap();
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("user.json")).unwrap(),
            "{}"
        );
    }

    #[test]
    fn test_encrypted_store_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path(), true);

        assert!(matches!(
            open_configured_store(&config, None),
            Err(StorageError::Encryption(_))
        ));

        let mut store = open_configured_store(&config, Some("pw")).unwrap();
        store.set("user", r#"{"email":"a@x.com"}"#).unwrap();
        let raw = std::fs::read_to_string(temp_dir.path().join("user.json")).unwrap();
        assert!(!raw.contains("a@x.com"));

        let store = open_configured_store(&config, Some("pw")).unwrap();
        assert_eq!(
            store.get("user").unwrap().as_deref(),
            Some(r#"{"email":"a@x.com"}"#)
        );
    }
}
