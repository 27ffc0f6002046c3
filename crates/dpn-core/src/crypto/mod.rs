//! Cryptographic primitive used by the encryption tool.
//!
//! The rest of the system treats encryption as an opaque collaborator behind
//! the [`Cipher`] trait:
//!
//! - `encrypt(plaintext, key) -> ciphertext`
//! - `decrypt(ciphertext, key) -> plaintext | failure`
//!
//! Keys are arbitrary strings typed by the user or produced by
//! [`generate_key`], which draws 256 bits from the operating system's CSPRNG.
//!
//! Note: the DPN link itself is simulated.  Nothing in the connection,
//! transfer, or handoff flow is encrypted; only the standalone encryption tool
//! uses this module.

mod aes;

pub use aes::AesGcmCipher;

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Size of a generated key in bytes (256 bits).
pub const KEY_BYTES: usize = 32;

/// Errors produced by the cipher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("encryption key must not be empty")]
    EmptyKey,
    #[error("ciphertext is not valid base64: {0}")]
    Encoding(String),
    #[error("ciphertext is too short to contain a nonce")]
    Truncated,
    #[error("decryption failed: wrong key or corrupted ciphertext")]
    Authentication,
    #[error("decrypted bytes are not valid UTF-8")]
    NotUtf8,
    #[error("encryption failed")]
    Encrypt,
}

/// A symmetric text cipher keyed by a user-visible string.
pub trait Cipher: Send + Sync {
    /// Encrypts `plaintext` under `key`, returning printable ciphertext.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EmptyKey`] for an empty key.
    fn encrypt(&self, plaintext: &str, key: &str) -> Result<String, CryptoError>;

    /// Decrypts ciphertext produced by [`Cipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns a [`CryptoError`] when the input is malformed or the key is wrong.
    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<String, CryptoError>;
}

/// Generates a random 256-bit key rendered as 64 lowercase hex characters.
pub fn generate_key() -> String {
    let mut key = [0u8; KEY_BYTES];
    OsRng.fill_bytes(&mut key);
    hex::encode(key)
}
