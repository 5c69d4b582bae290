use std::fmt;
use std::io;

use crate::modules::encryption::{derive_key_from_passphrase, generate_random_salt};

/// Reasons a password fails the strong password policy
#[derive(Debug, PartialEq)]
pub enum PasswordError {
    TooShort,
    NoUppercase,
    NoLowercase,
    NoNumber,
    NoSpecialChar,
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PasswordError::TooShort => "password must be at least 8 characters",
            PasswordError::NoUppercase => "password must contain an uppercase letter",
            PasswordError::NoLowercase => "password must contain a lowercase letter",
            PasswordError::NoNumber => "password must contain a number",
            PasswordError::NoSpecialChar => "password must contain a special character",
        };
        f.write_str(msg)
    }
}

/// Function to validate password strength
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < 8 {
        return Err(PasswordError::TooShort);
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(PasswordError::NoUppercase);
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(PasswordError::NoLowercase);
    }
    if !password.chars().any(|c| c.is_numeric()) {
        return Err(PasswordError::NoNumber);
    }
    if !password
        .chars()
        .any(|c| "!@#$%^&*()_+-=[]{}|;:,.<>?".contains(c))
    {
        return Err(PasswordError::NoSpecialChar);
    }
    Ok(())
}

/// Salted PBKDF2 hash ready to be stored on an account
#[derive(Debug, Clone)]
pub struct PasswordHash {
    pub hash: String,
    pub salt: String,
    pub iterations: u32,
}

/// Hash a password with a fresh per-account salt
pub fn hash_password(password: &str, iterations: u32) -> PasswordHash {
    let salt = generate_random_salt();
    let hash = derive_key_from_passphrase(password, &salt, iterations);
    PasswordHash {
        hash: hex::encode(hash),
        salt: hex::encode(salt),
        iterations,
    }
}

/// Check a password against a stored hash, salt and iteration count
pub fn verify_password(password: &str, hash_hex: &str, salt_hex: &str, iterations: u32) -> bool {
    let (expected, salt) = match (hex::decode(hash_hex), hex::decode(salt_hex)) {
        (Ok(expected), Ok(salt)) => (expected, salt),
        _ => return false,
    };
    let actual = derive_key_from_passphrase(password, &salt, iterations);
    constant_time_eq(&actual, &expected)
}

/// Spend the same work as a real verification when the email is unknown
pub fn burn_verification(password: &str, iterations: u32) {
    let salt = [0u8; 16];
    let _ = derive_key_from_passphrase(password, &salt, iterations);
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Helper function to read a password securely
pub fn read_password() -> io::Result<String> {
    rpassword::read_password()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ITERATIONS: u32 = 1_000;

    #[test]
    fn test_password_validation() {
        assert!(validate_password("Password123!").is_ok());
        assert_eq!(validate_password("Pass1!"), Err(PasswordError::TooShort));
        assert_eq!(validate_password("password123!"), Err(PasswordError::NoUppercase));
        assert_eq!(validate_password("PASSWORD123!"), Err(PasswordError::NoLowercase));
        assert_eq!(validate_password("Password!"), Err(PasswordError::NoNumber));
        assert_eq!(validate_password("Password123"), Err(PasswordError::NoSpecialChar));
    }

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("p1", TEST_ITERATIONS);
        assert_eq!(hashed.iterations, TEST_ITERATIONS);
        assert_ne!(hashed.hash, "p1");

        assert!(verify_password("p1", &hashed.hash, &hashed.salt, TEST_ITERATIONS));
        assert!(!verify_password("p2", &hashed.hash, &hashed.salt, TEST_ITERATIONS));
        assert!(!verify_password("p1", &hashed.hash, &hashed.salt, TEST_ITERATIONS + 1));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let a = hash_password("same", TEST_ITERATIONS);
        let b = hash_password("same", TEST_ITERATIONS);
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_corrupt_hash_never_verifies() {
        assert!(!verify_password("p1", "not-hex", "00", TEST_ITERATIONS));
        assert!(!verify_password("p1", "00", "zz", TEST_ITERATIONS));
        assert!(!verify_password("p1", "", "", TEST_ITERATIONS));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
