// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{auth, config, encryption, storage, utils};

// Re-export commonly used types
pub use modules::auth::{
    Account, Emblem, ProfileUpdate, Session, SessionError, SessionManager, SessionState,
    SessionStore, SharedSession,
};
pub use modules::config::AppConfig;
pub use modules::storage::{EncryptedStore, FileStore, KeyValueStore, MemoryStore, StorageError};

// Storage keys
pub const SESSION_KEY: &str = "user";
pub const ACCOUNTS_KEY: &str = "users";
pub const STORE_SALT_KEY: &str = "store_salt";

// Defaults
pub const DEFAULT_DATA_DIR: &str = ".calcutta";
pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_HASH_ITERATIONS: u32 = 100_000;

// Type aliases
pub type HmacSha256 = hmac::Hmac<sha2::Sha256>;
