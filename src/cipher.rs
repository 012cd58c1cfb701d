//! Credential field-map encryption
//!
//! The platform stores each credential's field map as a single encrypted
//! string column; this module is the encrypt side of that contract. Key
//! derivation is argon2id over a fresh random salt, sealing is
//! ChaCha20-Poly1305 under a fresh nonce, and the output layout is
//! `base64(salt || nonce || ciphertext)` so every encryption is
//! self-describing and decryptable with only the deployment key.

use argon2::Argon2;
use base64::Engine;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce};
use eyre::{Result, eyre};
use rand::RngCore;
use rand::rngs::OsRng;
use serde_json::{Map, Value};

/// Salt length for key derivation (16 bytes)
const SALT_LEN: usize = 16;

/// Nonce length for ChaCha20-Poly1305 (12 bytes)
const NONCE_LEN: usize = 12;

/// Field-map cipher configured with the deployment encryption key
pub struct Cipher {
    encryption_key: String,
}

impl Cipher {
    pub fn new(encryption_key: impl Into<String>) -> Self {
        Self {
            encryption_key: encryption_key.into(),
        }
    }

    /// Encrypt a credential field map to its stored string form.
    ///
    /// Fresh salt and nonce per call, so encrypting the same map twice
    /// yields different ciphertexts.
    pub fn encrypt(&self, data: &Map<String, Value>) -> Result<String> {
        let plaintext = serde_json::to_vec(data)?;

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let key = self.derive_key(&salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_ref())
            .map_err(|e| eyre!("Failed to encrypt credential data: {e}"))?;

        let mut sealed = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&salt);
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(base64::engine::general_purpose::STANDARD.encode(sealed))
    }

    /// Decrypt a stored string back to its field map
    pub fn decrypt(&self, encoded: &str) -> Result<Map<String, Value>> {
        let sealed = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| eyre!("Invalid encrypted credential encoding: {e}"))?;
        if sealed.len() < SALT_LEN + NONCE_LEN {
            eyre::bail!("Encrypted credential data is truncated");
        }

        let (salt, rest) = sealed.split_at(SALT_LEN);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

        let key = self.derive_key(salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| eyre!("Failed to decrypt credential data: {e}"))?;

        Ok(serde_json::from_slice(&plaintext)?)
    }

    fn derive_key(&self, salt: &[u8]) -> Result<[u8; 32]> {
        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(self.encryption_key.as_bytes(), salt, &mut key)
            .map_err(|e| eyre!("Key derivation failed: {e}"))?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_map() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("host".to_string(), json!("db.internal"));
        map.insert("port".to_string(), json!(5432));
        map.insert("ssl".to_string(), json!(true));
        map
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let cipher = Cipher::new("test-encryption-key");
        let encrypted = cipher.encrypt(&field_map()).unwrap();
        let decrypted = cipher.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, field_map());
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_call() {
        let cipher = Cipher::new("test-encryption-key");
        let first = cipher.encrypt(&field_map()).unwrap();
        let second = cipher.encrypt(&field_map()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = Cipher::new("right-key").encrypt(&field_map()).unwrap();
        assert!(Cipher::new("wrong-key").decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_garbage_input_fails() {
        let cipher = Cipher::new("test-encryption-key");
        assert!(cipher.decrypt("not-base64!!!").is_err());
        assert!(cipher.decrypt("dG9vLXNob3J0").is_err());
    }
}
