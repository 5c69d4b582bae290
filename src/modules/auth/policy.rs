use serde::{Deserialize, Serialize};

use super::errors::SessionError;
use super::password::validate_password;
use crate::DEFAULT_HASH_ITERATIONS;

/// What signup (and an email change) does when the email is already taken
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateEmailPolicy {
    /// Last write wins; the older account is discarded
    #[default]
    Overwrite,
    Reject,
}

/// What `update_profile` does when nobody is logged in
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoggedOutUpdatePolicy {
    #[default]
    Ignore,
    Reject,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PasswordPolicy {
    #[default]
    NonEmpty,
    Strong,
}

impl PasswordPolicy {
    pub fn check(&self, password: &str) -> Result<(), SessionError> {
        match self {
            // Emptiness is already rejected by the required-field check
            PasswordPolicy::NonEmpty => Ok(()),
            PasswordPolicy::Strong => {
                validate_password(password).map_err(|e| SessionError::Validation(e.to_string()))
            }
        }
    }
}

/// Behavioral knobs for a `SessionStore`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionPolicy {
    pub duplicate_email: DuplicateEmailPolicy,
    pub logged_out_update: LoggedOutUpdatePolicy,
    pub password_policy: PasswordPolicy,
    pub hash_iterations: u32,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            duplicate_email: DuplicateEmailPolicy::default(),
            logged_out_update: LoggedOutUpdatePolicy::default(),
            password_policy: PasswordPolicy::default(),
            hash_iterations: DEFAULT_HASH_ITERATIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_deserialization() {
        let policy: SessionPolicy = serde_json::from_str(
            r#"{"duplicate_email":"reject","logged_out_update":"reject","password_policy":"strong"}"#,
        )
        .unwrap();
        assert_eq!(policy.duplicate_email, DuplicateEmailPolicy::Reject);
        assert_eq!(policy.logged_out_update, LoggedOutUpdatePolicy::Reject);
        assert_eq!(policy.password_policy, PasswordPolicy::Strong);
        assert_eq!(policy.hash_iterations, DEFAULT_HASH_ITERATIONS);

        let empty: SessionPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SessionPolicy::default());
    }

    #[test]
    fn test_password_policy_check() {
        assert!(PasswordPolicy::NonEmpty.check("p").is_ok());
        assert!(matches!(
            PasswordPolicy::Strong.check("p"),
            Err(SessionError::Validation(_))
        ));
        assert!(PasswordPolicy::Strong.check("Password123!").is_ok());
    }
}
