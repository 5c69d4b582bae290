use crate::modules::storage::StorageError;

/// Errors surfaced by session operations.
///
/// `InvalidCredentials` deliberately does not say whether the email exists.
#[derive(Debug)]
pub enum SessionError {
    Validation(String),
    InvalidCredentials,
    NotAuthenticated,
    DuplicateEmail(String),
    AccountMissing(String),
    Storage(StorageError),
}

impl From<StorageError> for SessionError {
    fn from(error: StorageError) -> Self {
        SessionError::Storage(error)
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Validation(msg) => write!(f, "Validation error: {}", msg),
            SessionError::InvalidCredentials => write!(f, "Invalid email or password"),
            SessionError::NotAuthenticated => write!(f, "Not logged in"),
            SessionError::DuplicateEmail(email) => {
                write!(f, "An account with email {} already exists", email)
            }
            SessionError::AccountMissing(id) => {
                write!(f, "Account {} for the current session no longer exists", id)
            }
            SessionError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

/// Reject empty or whitespace-only required fields
pub fn require_field(field: &str, value: &str) -> Result<(), SessionError> {
    if value.trim().is_empty() {
        return Err(SessionError::Validation(format!("{} is required", field)));
    }
    Ok(())
}
