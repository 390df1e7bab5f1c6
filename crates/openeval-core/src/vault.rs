//! Token vault: AES-256-GCM encryption for provider tokens at rest.
//!
//! # Format
//!
//! Every call draws a fresh 16-byte IV. The stored value is
//!
//! ```text
//! base64( iv[16] || auth_tag[16] || ciphertext )
//! ```
//!
//! Rows written by the dashboard use the same layout.
//!
//! # Example
//!
//! ```
//! use openeval_core::vault::TokenVault;
//!
//! let vault = TokenVault::from_hex(&"11".repeat(32)).unwrap();
//! let sealed = vault.encrypt("access-token").unwrap();
//! assert_eq!(vault.decrypt(&sealed).unwrap(), "access-token");
//! ```

use std::fmt;

use aes_gcm::aead::Aead;
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, KeyInit, Nonce};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;
use rand::rngs::OsRng;

/// AES-256-GCM with a 128-bit nonce.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// IV length in bytes.
pub const IV_LEN: usize = 16;
/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;
/// Key length in bytes.
pub const KEY_LEN: usize = 32;

/// Errors raised by the token vault.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The key is missing or not 32 bytes of hex.
    #[error("token encryption key is misconfigured: {0}")]
    Config(String),

    /// Encryption failed inside the cipher.
    #[error("failed to encrypt token")]
    Encrypt,

    /// The ciphertext is corrupt, truncated, or was sealed with another key.
    #[error("failed to decrypt token: {0}")]
    Decrypt(String),
}

/// Symmetric vault for OAuth tokens.
///
/// Built once at startup and handed to whoever needs it; there is no global
/// key.
#[derive(Clone)]
pub struct TokenVault {
    key: [u8; KEY_LEN],
}

impl TokenVault {
    /// Create a vault from raw key bytes.
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Create a vault from a 64-character hex key.
    pub fn from_hex(key_hex: &str) -> Result<Self, VaultError> {
        let bytes = hex::decode(key_hex.trim())
            .map_err(|e| VaultError::Config(format!("key is not valid hex: {}", e)))?;

        if bytes.len() != KEY_LEN {
            return Err(VaultError::Config(format!(
                "key must be {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }

        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        Ok(Self::new(key))
    }

    /// Generate a fresh random key, hex encoded, suitable for `from_hex`.
    pub fn generate_key_hex() -> String {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        hex::encode(key)
    }

    fn cipher(&self) -> Aes256Gcm16 {
        Aes256Gcm16::new(GenericArray::from_slice(&self.key))
    }

    /// Encrypt a token and return the base64 envelope.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        // aes-gcm returns ciphertext || tag
        let sealed = self
            .cipher()
            .encrypt(Nonce::<U16>::from_slice(&iv), plaintext.as_bytes())
            .map_err(|_| VaultError::Encrypt)?;
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        let mut envelope = Vec::with_capacity(IV_LEN + TAG_LEN + ciphertext.len());
        envelope.extend_from_slice(&iv);
        envelope.extend_from_slice(tag);
        envelope.extend_from_slice(ciphertext);

        Ok(BASE64.encode(envelope))
    }

    /// Decrypt a base64 envelope produced by [`TokenVault::encrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<String, VaultError> {
        let envelope = BASE64
            .decode(encoded.trim())
            .map_err(|e| VaultError::Decrypt(format!("invalid base64: {}", e)))?;

        if envelope.len() < IV_LEN + TAG_LEN {
            return Err(VaultError::Decrypt(format!(
                "envelope too short: {} bytes",
                envelope.len()
            )));
        }

        let (iv, rest) = envelope.split_at(IV_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        let plaintext = self
            .cipher()
            .decrypt(Nonce::<U16>::from_slice(iv), sealed.as_slice())
            .map_err(|_| VaultError::Decrypt("authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| VaultError::Decrypt(format!("plaintext is not UTF-8: {}", e)))
    }
}

impl fmt::Debug for TokenVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVault").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vault() -> TokenVault {
        TokenVault::new([7u8; KEY_LEN])
    }

    #[test]
    fn test_roundtrip() {
        let vault = test_vault();
        let long = "x".repeat(4096);
        for plaintext in ["", "a", "clio-access-token-123", "ünïcødé ✓", long.as_str()] {
            let sealed = vault.encrypt(plaintext).unwrap();
            assert_eq!(vault.decrypt(&sealed).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_envelope_layout() {
        let vault = test_vault();
        let sealed = vault.encrypt("abcd").unwrap();
        let raw = BASE64.decode(sealed).unwrap();
        assert_eq!(raw.len(), IV_LEN + TAG_LEN + 4);
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let vault = test_vault();
        let a = vault.encrypt("same").unwrap();
        let b = vault.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_tag_fails() {
        let vault = test_vault();
        let sealed = vault.encrypt("secret").unwrap();
        let mut raw = BASE64.decode(&sealed).unwrap();
        for i in IV_LEN..IV_LEN + TAG_LEN {
            let mut flipped = raw.clone();
            flipped[i] ^= 0x01;
            let result = vault.decrypt(&BASE64.encode(&flipped));
            assert!(matches!(result, Err(VaultError::Decrypt(_))));
        }
        // Ciphertext bytes are authenticated too
        let last = raw.len() - 1;
        raw[last] ^= 0x80;
        assert!(vault.decrypt(&BASE64.encode(&raw)).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = test_vault().encrypt("secret").unwrap();
        let other = TokenVault::new([8u8; KEY_LEN]);
        assert!(matches!(other.decrypt(&sealed), Err(VaultError::Decrypt(_))));
    }

    #[test]
    fn test_truncated_envelope_fails() {
        let vault = test_vault();
        let short = BASE64.encode([0u8; IV_LEN + TAG_LEN - 1]);
        assert!(matches!(vault.decrypt(&short), Err(VaultError::Decrypt(_))));
        assert!(vault.decrypt("not base64 at all!").is_err());
    }

    #[test]
    fn test_from_hex_validation() {
        assert!(TokenVault::from_hex(&"ab".repeat(32)).is_ok());
        assert!(matches!(
            TokenVault::from_hex(&"ab".repeat(16)),
            Err(VaultError::Config(_))
        ));
        assert!(matches!(
            TokenVault::from_hex(&"zz".repeat(32)),
            Err(VaultError::Config(_))
        ));
        assert!(matches!(TokenVault::from_hex(""), Err(VaultError::Config(_))));
    }

    #[test]
    fn test_generated_key_is_usable() {
        let key = TokenVault::generate_key_hex();
        assert_eq!(key.len(), 64);
        let vault = TokenVault::from_hex(&key).unwrap();
        let sealed = vault.encrypt("t").unwrap();
        assert_eq!(vault.decrypt(&sealed).unwrap(), "t");
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", test_vault());
        assert!(!rendered.contains('7'));
    }
}
