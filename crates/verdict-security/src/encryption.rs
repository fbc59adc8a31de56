//! Symmetric encryption with key stretching
//!
//! A caller-supplied secret is stretched through PBKDF2-HMAC-SHA256 with
//! a fixed domain-separating salt into a 32-byte key for AES-256-GCM.
//! Ciphertext is `base64url(nonce || sealed)`; the GCM tag authenticates,
//! so decryption under any other key fails rather than returning garbage.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use verdict_types::error::{Result, VerdictError};

/// Domain-separating salt for key derivation
const KDF_SALT: &[u8] = b"verdict_encryption_v1";
/// PBKDF2 iteration count
const KDF_ROUNDS: u32 = 100_000;
/// AES-GCM nonce length in bytes
const NONCE_LEN: usize = 12;

/// Authenticated symmetric encryption bound to one stretched key
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService").finish_non_exhaustive()
    }
}

impl EncryptionService {
    /// Build a service from a raw secret.
    ///
    /// A missing or blank secret is a fatal configuration error; there is
    /// no fallback key.
    pub fn new(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(VerdictError::Encryption(
                "encryption key is required and must be non-empty".into(),
            ));
        }
        let mut key_bytes = [0u8; 32];
        pbkdf2_hmac::<Sha256>(secret.as_bytes(), KDF_SALT, KDF_ROUNDS, &mut key_bytes);
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Encrypt a string; returns base64url `nonce || ciphertext`
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| VerdictError::Encryption(format!("encryption failed: {e}")))?;
        let mut payload = Vec::with_capacity(NONCE_LEN + sealed.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&sealed);
        Ok(URL_SAFE.encode(payload))
    }

    /// Decrypt base64url ciphertext produced by [`Self::encrypt`].
    ///
    /// Fails with [`VerdictError::Encryption`] on corrupt input or a
    /// wrong key.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let payload = URL_SAFE
            .decode(ciphertext)
            .map_err(|e| VerdictError::Encryption(format!("decryption failed: {e}")))?;
        if payload.len() <= NONCE_LEN {
            return Err(VerdictError::Encryption("decryption failed: truncated payload".into()));
        }
        let (nonce, sealed) = payload.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| VerdictError::Encryption("decryption failed: invalid or wrong key".into()))?;
        String::from_utf8(plain)
            .map_err(|e| VerdictError::Encryption(format!("decryption failed: {e}")))
    }
}
