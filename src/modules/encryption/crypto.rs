use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use super::keys::generate_random_nonce;

/// AES-GCM nonce length; the nonce is stored in front of the ciphertext
pub const NONCE_LEN: usize = 12;

/// Function to encrypt data using AES-256-GCM.
///
/// Returns `nonce || ciphertext`. A fresh nonce is drawn for every call.
pub fn encrypt_data(data: &str, encryption_key: &[u8]) -> Result<Vec<u8>, String> {
    let cipher = Aes256Gcm::new_from_slice(encryption_key)
        .map_err(|_| "Invalid encryption key length".to_string())?;

    let nonce = generate_random_nonce();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), data.as_bytes())
        .map_err(|_| "Encryption failed".to_string())?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Function to decrypt data produced by `encrypt_data`
pub fn decrypt_data(sealed: &[u8], encryption_key: &[u8]) -> Result<String, String> {
    if sealed.len() < NONCE_LEN {
        return Err("Encrypted data is too short".to_string());
    }

    let cipher = Aes256Gcm::new_from_slice(encryption_key)
        .map_err(|_| "Invalid encryption key length".to_string())?;

    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    match cipher.decrypt(Nonce::from_slice(nonce), ciphertext) {
        Ok(decrypted_data) => match String::from_utf8(decrypted_data) {
            Ok(decoded_str) => Ok(decoded_str),
            Err(_) => Err("Decrypted data is not valid UTF-8".to_string()),
        },
        Err(_) => Err("Decryption failed".to_string()),
    }
}
