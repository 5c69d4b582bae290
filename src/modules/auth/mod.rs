pub mod errors;
pub mod model;
pub mod password;
pub mod policy;
pub mod session;
pub mod shared;
pub mod store;
pub mod user_interface;

// Re-export the main types and functions
pub use errors::SessionError;
pub use model::{Account, Emblem, ProfileUpdate, Session};
pub use password::{validate_password, PasswordError};
pub use policy::{DuplicateEmailPolicy, LoggedOutUpdatePolicy, PasswordPolicy, SessionPolicy};
pub use session::{SessionManager, SessionState, SessionStore};
pub use shared::SharedSession;
pub use store::AccountStore;
