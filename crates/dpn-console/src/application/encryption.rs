//! EncryptionWorkflow: the standalone text encryption tool.
//!
//! The user either supplies a key or asks for a random one.  Either way the
//! key actually used is returned next to the ciphertext so it can be shared
//! with whoever decrypts.

use std::sync::Arc;

use dpn_core::{generate_key, Cipher, CryptoError};
use tracing::{debug, warn};

/// Where the encryption key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// 256 bits from the OS CSPRNG.
    Random,
    /// A key typed by the user.
    Manual(String),
}

/// Ciphertext together with the key that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionResult {
    pub ciphertext: String,
    pub key: String,
}

pub struct EncryptionWorkflow {
    cipher: Arc<dyn Cipher>,
}

impl EncryptionWorkflow {
    pub fn new(cipher: Arc<dyn Cipher>) -> Self {
        Self { cipher }
    }

    /// Encrypts `plaintext` with a key from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EmptyKey`] for an empty manual key.
    pub fn encrypt(
        &self,
        plaintext: &str,
        source: KeySource,
    ) -> Result<EncryptionResult, CryptoError> {
        let key = match source {
            KeySource::Random => generate_key(),
            KeySource::Manual(key) => key,
        };
        let ciphertext = self.cipher.encrypt(plaintext, &key)?;
        debug!("encrypted {} bytes", plaintext.len());
        Ok(EncryptionResult { ciphertext, key })
    }

    /// Decrypts `ciphertext` with `key`.
    pub fn decrypt(&self, ciphertext: &str, key: &str) -> Result<String, CryptoError> {
        self.cipher.decrypt(ciphertext, key).map_err(|e| {
            warn!("decryption failed: {e}");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpn_core::AesGcmCipher;

    fn workflow() -> EncryptionWorkflow {
        EncryptionWorkflow::new(Arc::new(AesGcmCipher::new()))
    }

    #[test]
    fn test_random_key_is_returned_and_decrypts() {
        let wf = workflow();

        let result = wf.encrypt("top secret", KeySource::Random).unwrap();

        assert_eq!(result.key.len(), 64);
        assert_eq!(wf.decrypt(&result.ciphertext, &result.key).unwrap(), "top secret");
    }

    #[test]
    fn test_manual_key_is_used_verbatim() {
        let wf = workflow();
        let result = wf
            .encrypt("hello", KeySource::Manual("hunter2".to_string()))
            .unwrap();
        assert_eq!(result.key, "hunter2");
        assert_eq!(wf.decrypt(&result.ciphertext, "hunter2").unwrap(), "hello");
    }

    #[test]
    fn test_empty_manual_key_is_rejected() {
        let result = workflow().encrypt("hello", KeySource::Manual(String::new()));
        assert_eq!(result, Err(CryptoError::EmptyKey));
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let wf = workflow();
        let result = wf
            .encrypt("hello", KeySource::Manual("right".to_string()))
            .unwrap();
        assert_eq!(
            wf.decrypt(&result.ciphertext, "wrong"),
            Err(CryptoError::Authentication)
        );
    }
}
