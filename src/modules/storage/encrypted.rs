use base64::{engine::general_purpose::STANDARD as base64, Engine as _};
use log::info;

use super::{KeyValueStore, StorageError};
use crate::modules::encryption::{
    decrypt_data, derive_key_from_passphrase, encrypt_data, generate_random_salt,
};
use crate::STORE_SALT_KEY;

/// Wraps another store and seals every value with AES-256-GCM.
///
/// The key is derived from a passphrase; its salt is kept in plaintext hex
/// under `STORE_SALT_KEY` in the inner store. Values are written as
/// `base64(nonce || ciphertext)`.
pub struct EncryptedStore<S: KeyValueStore> {
    inner: S,
    key: Vec<u8>,
}

impl<S: KeyValueStore> EncryptedStore<S> {
    /// Open an encrypted view over `inner`, creating the salt on first use
    pub fn open(mut inner: S, passphrase: &str, iterations: u32) -> Result<Self, StorageError> {
        let salt = match inner.get(STORE_SALT_KEY)? {
            Some(encoded) => hex::decode(encoded.trim())
                .map_err(|e| StorageError::Serialization(format!("store salt: {}", e)))?,
            None => {
                let salt = generate_random_salt();
                inner.set(STORE_SALT_KEY, &hex::encode(&salt))?;
                info!("Initialized encrypted store with a new salt");
                salt
            }
        };

        let key = derive_key_from_passphrase(passphrase, &salt, iterations);
        Ok(Self { inner, key })
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn check_key(key: &str) -> Result<(), StorageError> {
        if key == STORE_SALT_KEY {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }
}

impl<S: KeyValueStore> KeyValueStore for EncryptedStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::check_key(key)?;
        let encoded = match self.inner.get(key)? {
            Some(encoded) => encoded,
            None => return Ok(None),
        };

        let sealed = base64
            .decode(encoded.trim())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let value = decrypt_data(&sealed, &self.key).map_err(StorageError::Encryption)?;
        Ok(Some(value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::check_key(key)?;
        let sealed = encrypt_data(value, &self.key).map_err(StorageError::Encryption)?;
        self.inner.set(key, &base64.encode(sealed))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        Self::check_key(key)?;
        self.inner.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::MemoryStore;

    const TEST_ITERATIONS: u32 = 1_000;

    #[test]
    fn test_values_are_sealed() {
        let mut store = EncryptedStore::open(MemoryStore::new(), "hunter2", TEST_ITERATIONS).unwrap();
        store.set("user", r#"{"email":"a@x.com"}"#).unwrap();

        assert_eq!(
            store.get("user").unwrap().as_deref(),
            Some(r#"{"email":"a@x.com"}"#)
        );

        let inner = store.into_inner();
        let raw = inner.get("user").unwrap().unwrap();
        assert!(!raw.contains("a@x.com"));
        assert!(inner.get(STORE_SALT_KEY).unwrap().is_some());
    }

    #[test]
    fn test_reopen_with_same_passphrase() {
        let mut store = EncryptedStore::open(MemoryStore::new(), "hunter2", TEST_ITERATIONS).unwrap();
        store.set("users", "[]").unwrap();

        let reopened = EncryptedStore::open(store.into_inner(), "hunter2", TEST_ITERATIONS).unwrap();
        assert_eq!(reopened.get("users").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let mut store = EncryptedStore::open(MemoryStore::new(), "hunter2", TEST_ITERATIONS).unwrap();
        store.set("users", "[]").unwrap();

        let reopened = EncryptedStore::open(store.into_inner(), "wrong", TEST_ITERATIONS).unwrap();
        assert!(matches!(
            reopened.get("users"),
            Err(StorageError::Encryption(_))
        ));
    }

    #[test]
    fn test_missing_key_and_reserved_key() {
        let mut store = EncryptedStore::open(MemoryStore::new(), "pw", TEST_ITERATIONS).unwrap();
        assert_eq!(store.get("user").unwrap(), None);
        store.remove("user").unwrap();

        assert!(matches!(
            store.set(STORE_SALT_KEY, "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.get(STORE_SALT_KEY),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
