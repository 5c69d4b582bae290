use crate::HmacSha256;
use pbkdf2::pbkdf2;
use rand::Rng;

use super::crypto::NONCE_LEN;

/// Length in bytes of every salt we generate
pub const SALT_LEN: usize = 16;

/// AES-256 and the stored password hashes both use 32-byte keys
pub const KEY_LEN: usize = 32;

/// Function to generate a random salt for PBKDF2
pub fn generate_random_salt() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..SALT_LEN).map(|_| rng.gen()).collect()
}

/// Function to generate a random nonce for AES-GCM
pub fn generate_random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill(&mut nonce);
    nonce
}

/// Function to derive a 32-byte key from the passphrase using PBKDF2
pub fn derive_key_from_passphrase(passphrase: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut key = vec![0u8; KEY_LEN];

    // A zero round count would panic inside pbkdf2
    pbkdf2::<HmacSha256>(passphrase.as_bytes(), salt, iterations.max(1), &mut key);

    key
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ITERATIONS: u32 = 1_000;

    #[test]
    fn test_key_derivation() {
        let passphrase = "MySecurePassword123!";
        let salt = generate_random_salt();

        let key = derive_key_from_passphrase(passphrase, &salt, TEST_ITERATIONS);
        assert_eq!(key.len(), KEY_LEN);

        let key2 = derive_key_from_passphrase(passphrase, &salt, TEST_ITERATIONS);
        assert_eq!(key, key2);

        let different_passphrase = "DifferentPassword456!";
        let key3 = derive_key_from_passphrase(different_passphrase, &salt, TEST_ITERATIONS);
        assert_ne!(key, key3);

        let different_salt = generate_random_salt();
        let key4 = derive_key_from_passphrase(passphrase, &different_salt, TEST_ITERATIONS);
        assert_ne!(key, key4);

        // Iteration count is part of the derivation
        let key5 = derive_key_from_passphrase(passphrase, &salt, TEST_ITERATIONS + 1);
        assert_ne!(key, key5);
    }

    #[test]
    fn test_zero_iterations_is_clamped() {
        let salt = generate_random_salt();
        let key = derive_key_from_passphrase("pw", &salt, 0);
        assert_eq!(key, derive_key_from_passphrase("pw", &salt, 1));
    }

    #[test]
    fn test_random_generation() {
        let salt1 = generate_random_salt();
        let salt2 = generate_random_salt();
        assert_eq!(salt1.len(), SALT_LEN);
        assert_ne!(salt1, salt2);

        let nonce1 = generate_random_nonce();
        let nonce2 = generate_random_nonce();
        assert_ne!(nonce1, nonce2);
    }
}
