//! AES-256-GCM implementation of [`Cipher`].
//!
//! Wire format of the printable ciphertext:
//!
//! ```text
//! base64( nonce[12] || aes_gcm_seal(plaintext) )
//! ```
//!
//! The user-supplied key string is stretched to 32 bytes with SHA-256, so any
//! non-empty passphrase (including a generated hex key) is usable.  A fresh
//! random nonce is drawn for every message.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::{Cipher, CryptoError};

/// AES-GCM standard nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

/// Stateless AES-256-GCM cipher.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesGcmCipher;

impl AesGcmCipher {
    pub fn new() -> Self {
        Self
    }

    fn cipher_for(key: &str) -> Result<Aes256Gcm, CryptoError> {
        if key.is_empty() {
            return Err(CryptoError::EmptyKey);
        }
        let digest = Sha256::digest(key.as_bytes());
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(digest.as_slice())))
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str, key: &str) -> Result<String, CryptoError> {
        let cipher = Self::cipher_for(key)?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut envelope = Vec::with_capacity(NONCE_LEN + sealed.len());
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&sealed);
        Ok(general_purpose::STANDARD.encode(envelope))
    }

    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<String, CryptoError> {
        let cipher = Self::cipher_for(key)?;

        let envelope = general_purpose::STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        if envelope.len() < NONCE_LEN {
            return Err(CryptoError::Truncated);
        }
        let (nonce, sealed) = envelope.split_at(NONCE_LEN);

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::Authentication)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::NotUtf8)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
