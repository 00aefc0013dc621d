//! AES-256-GCM seal/open with caller-supplied nonces
//!
//! Sealed output is `[N bytes: ciphertext][16 bytes: GCM tag]`; the nonce is
//! carried separately by the envelope. No associated data is bound.

use std::sync::Arc;

use crate::error::CryptoError;
use crate::kdf::DerivedKey;
use crate::provider::CryptoProvider;
use crate::NONCE_SIZE;

/// A 96-bit AES-GCM nonce. Must never repeat under the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct Cipher {
    provider: Arc<dyn CryptoProvider>,
}

impl Cipher {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Draw a fresh random nonce. Call once per seal.
    pub fn generate_nonce(&self) -> Result<Nonce, CryptoError> {
        let mut bytes = [0u8; NONCE_SIZE];
        self.provider.fill_random(&mut bytes)?;
        Ok(Nonce(bytes))
    }

    /// Encrypt `plaintext`, returning ciphertext with the tag appended.
    pub fn seal(
        &self,
        key: &DerivedKey,
        nonce: &Nonce,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        self.provider
            .aes256gcm_seal(key.as_bytes(), nonce.as_bytes(), plaintext)
    }

    /// Decrypt and authenticate `ciphertext` (ciphertext || tag).
    ///
    /// Fails closed: every failure is `CryptoError::Authentication` with no
    /// plaintext.
    pub fn open(
        &self,
        key: &DerivedKey,
        nonce: &Nonce,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        self.provider
            .aes256gcm_open(key.as_bytes(), nonce.as_bytes(), ciphertext)
            .map_err(|_| CryptoError::Authentication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::default_provider;
    use crate::{KEY_SIZE, TAG_SIZE};
    use std::collections::HashSet;

    fn test_key(byte: u8) -> DerivedKey {
        DerivedKey::from_bytes([byte; KEY_SIZE])
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let cipher = Cipher::new(default_provider());
        let key = test_key(0x42);
        let nonce = cipher.generate_nonce().unwrap();
        let plaintext = b"hello, encrypted world!";

        let sealed = cipher.seal(&key, &nonce, plaintext).unwrap();
        let opened = cipher.open(&key, &nonce, &sealed).unwrap();

        assert_eq!(&opened, plaintext);
    }

    #[test]
    fn test_seal_open_empty() {
        let cipher = Cipher::new(default_provider());
        let key = test_key(0);
        let nonce = cipher.generate_nonce().unwrap();

        let sealed = cipher.seal(&key, &nonce, b"").unwrap();
        assert_eq!(sealed.len(), TAG_SIZE);
        assert_eq!(cipher.open(&key, &nonce, &sealed).unwrap(), b"");
    }

    #[test]
    fn test_open_wrong_key() {
        let cipher = Cipher::new(default_provider());
        let nonce = cipher.generate_nonce().unwrap();

        let sealed = cipher.seal(&test_key(1), &nonce, b"secret data").unwrap();
        let result = cipher.open(&test_key(2), &nonce, &sealed);

        assert!(matches!(result, Err(CryptoError::Authentication)));
    }

    #[test]
    fn test_open_wrong_nonce() {
        let cipher = Cipher::new(default_provider());
        let key = test_key(1);

        let sealed = cipher
            .seal(&key, &Nonce::from_bytes([1; NONCE_SIZE]), b"secret data")
            .unwrap();
        let result = cipher.open(&key, &Nonce::from_bytes([2; NONCE_SIZE]), &sealed);

        assert!(matches!(result, Err(CryptoError::Authentication)));
    }

    #[test]
    fn test_tampered_ciphertext() {
        let cipher = Cipher::new(default_provider());
        let key = test_key(9);
        let nonce = cipher.generate_nonce().unwrap();

        let mut sealed = cipher.seal(&key, &nonce, b"secret data").unwrap();
        sealed[3] ^= 0x01;

        let result = cipher.open(&key, &nonce, &sealed);
        assert!(matches!(result, Err(CryptoError::Authentication)));
    }

    #[test]
    fn test_truncated_ciphertext() {
        let cipher = Cipher::new(default_provider());
        let key = test_key(9);
        let nonce = cipher.generate_nonce().unwrap();

        let sealed = cipher.seal(&key, &nonce, b"secret data").unwrap();
        let result = cipher.open(&key, &nonce, &sealed[..sealed.len() - 1]);
        assert!(matches!(result, Err(CryptoError::Authentication)));
    }

    #[test]
    fn test_sealed_size() {
        let cipher = Cipher::new(default_provider());
        let nonce = cipher.generate_nonce().unwrap();
        let sealed = cipher.seal(&test_key(3), &nonce, &[0u8; 1000]).unwrap();

        // plaintext (1000) + tag (16)
        assert_eq!(sealed.len(), 1000 + TAG_SIZE);
    }

    #[test]
    fn test_nonce_uniqueness_over_10k_draws() {
        let cipher = Cipher::new(default_provider());
        let mut seen = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            let nonce = cipher.generate_nonce().unwrap();
            assert!(seen.insert(nonce), "nonce repeated");
        }
    }
}
