use crate::modules::storage::{KeyValueStore, StorageError};
use crate::ACCOUNTS_KEY;

use super::model::Account;

/// In-memory copy of the `users` collection.
///
/// Order is insertion order; an overwrite moves the account to the end.
#[derive(Debug, Default, Clone)]
pub struct AccountStore {
    accounts: Vec<Account>,
}

impl AccountStore {
    /// Read the collection; a missing entry is an empty collection
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, StorageError> {
        let accounts = match store.get(ACCOUNTS_KEY)? {
            Some(data) if !data.trim().is_empty() => serde_json::from_str(&data)?,
            _ => Vec::new(),
        };
        Ok(Self { accounts })
    }

    /// Write the whole collection back
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StorageError> {
        let data = serde_json::to_string_pretty(&self.accounts)?;
        store.set(ACCOUNTS_KEY, &data)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn find_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.email == email)
    }

    pub fn find_by_email_mut(&mut self, email: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.email == email)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.id == id)
    }

    /// Insert, discarding any account with the same email. Returns what was replaced.
    pub fn upsert_by_email(&mut self, account: Account) -> Option<Account> {
        let replaced = self
            .accounts
            .iter()
            .position(|a| a.email == account.email)
            .map(|index| self.accounts.remove(index));
        self.accounts.push(account);
        replaced
    }

    /// Remove every account using `email` other than the one with `keep_id`
    pub fn remove_email_except(&mut self, email: &str, keep_id: &str) -> Vec<Account> {
        let (removed, kept): (Vec<Account>, Vec<Account>) = std::mem::take(&mut self.accounts)
            .into_iter()
            .partition(|a| a.email == email && a.id != keep_id);
        self.accounts = kept;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::MemoryStore;

    fn account(id: &str, name: &str, email: &str) -> Account {
        Account {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "00".to_string(),
            salt: "00".to_string(),
            iterations: 1,
            phone: String::new(),
            emblem: None,
            created_at: 0,
            last_login: 0,
        }
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let store = MemoryStore::new();
        let accounts = AccountStore::load(&store).unwrap();
        assert!(accounts.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let mut store = MemoryStore::new();
        let mut accounts = AccountStore::default();
        accounts.upsert_by_email(account("1", "A", "a@x.com"));
        accounts.upsert_by_email(account("2", "B", "b@x.com"));
        accounts.save(&mut store).unwrap();

        let loaded = AccountStore::load(&store).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.accounts()[0].email, "a@x.com");
        assert_eq!(loaded.find_by_id("2").unwrap().name, "B");
    }

    #[test]
    fn test_upsert_replaces_same_email() {
        let mut accounts = AccountStore::default();
        accounts.upsert_by_email(account("1", "A", "a@x.com"));
        accounts.upsert_by_email(account("2", "B", "b@x.com"));

        let replaced = accounts.upsert_by_email(account("3", "C", "a@x.com"));
        assert_eq!(replaced.unwrap().id, "1");
        assert_eq!(accounts.len(), 2);
        // The overwriting account goes to the end
        assert_eq!(accounts.accounts()[1].id, "3");
        assert_eq!(accounts.find_by_email("a@x.com").unwrap().name, "C");
    }

    #[test]
    fn test_email_lookup_is_case_sensitive() {
        let mut accounts = AccountStore::default();
        accounts.upsert_by_email(account("1", "A", "a@x.com"));
        assert!(accounts.find_by_email("A@X.COM").is_none());
    }

    #[test]
    fn test_remove_email_except() {
        let mut accounts = AccountStore::default();
        accounts.upsert_by_email(account("1", "A", "a@x.com"));
        accounts.upsert_by_email(account("2", "B", "b@x.com"));

        let removed = accounts.remove_email_except("b@x.com", "1");
        assert_eq!(removed.len(), 1);
        assert_eq!(accounts.len(), 1);

        let removed = accounts.remove_email_except("a@x.com", "1");
        assert!(removed.is_empty());
        assert_eq!(accounts.len(), 1);
    }

    #[test]
    fn test_malformed_collection_is_an_error() {
        let mut store = MemoryStore::new();
        store.set(ACCOUNTS_KEY, "{not json").unwrap();
        assert!(matches!(
            AccountStore::load(&store),
            Err(StorageError::Serialization(_))
        ));
    }
}
