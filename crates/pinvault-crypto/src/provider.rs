//! Injectable cryptographic capability
//!
//! `KeyDeriver` and `Cipher` never reach for a global RNG or primitive; they
//! call through a `CryptoProvider` handed to them at construction. The
//! default provider is backed by the RustCrypto crates and the OS RNG.

use std::sync::Arc;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use crate::error::CryptoError;
use crate::{KEY_SIZE, NONCE_SIZE};

pub trait CryptoProvider: Send + Sync + std::fmt::Debug {
    /// Fill `dest` with cryptographically secure random bytes.
    fn fill_random(&self, dest: &mut [u8]) -> Result<(), CryptoError>;

    /// PBKDF2-HMAC-SHA256 of `password` and `salt` into `out`.
    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> Result<(), CryptoError>;

    /// AES-256-GCM encrypt with no associated data; returns ciphertext || tag.
    fn aes256gcm_seal(
        &self,
        key: &[u8; KEY_SIZE],
        nonce: &[u8; NONCE_SIZE],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// AES-256-GCM decrypt with no associated data.
    ///
    /// Every failure must map to `CryptoError::Authentication`.
    fn aes256gcm_open(
        &self,
        key: &[u8; KEY_SIZE],
        nonce: &[u8; NONCE_SIZE],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;
}

/// RustCrypto-backed provider (`pbkdf2`, `sha2`, `aes-gcm`, OS RNG).
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoProvider;

impl CryptoProvider for RustCryptoProvider {
    fn fill_random(&self, dest: &mut [u8]) -> Result<(), CryptoError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| CryptoError::Randomness(e.to_string()))
    }

    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> Result<(), CryptoError> {
        if iterations == 0 {
            return Err(CryptoError::KeyDerivation(
                "PBKDF2 iteration count must be non-zero".into(),
            ));
        }
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, out);
        Ok(())
    }

    fn aes256gcm_seal(
        &self,
        key: &[u8; KEY_SIZE],
        nonce: &[u8; NONCE_SIZE],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new(key.into());
        cipher
            .encrypt(nonce.into(), plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))
    }

    fn aes256gcm_open(
        &self,
        key: &[u8; KEY_SIZE],
        nonce: &[u8; NONCE_SIZE],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new(key.into());
        cipher
            .decrypt(nonce.into(), ciphertext)
            .map_err(|_| CryptoError::Authentication)
    }
}

/// The provider used when callers do not inject their own.
pub fn default_provider() -> Arc<dyn CryptoProvider> {
    Arc::new(RustCryptoProvider)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn test_pbkdf2_known_vector() {
        // RFC 7914 §11: PBKDF2-HMAC-SHA256, P="passwd", S="salt", c=1
        let mut out = [0u8; 32];
        RustCryptoProvider
            .pbkdf2_sha256(b"passwd", b"salt", 1, &mut out)
            .unwrap();
        assert_eq!(
            out.to_vec(),
            from_hex("55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc")
        );
    }

    #[test]
    fn test_pbkdf2_zero_iterations_rejected() {
        let mut out = [0u8; 32];
        let result = RustCryptoProvider.pbkdf2_sha256(b"pw", b"salt", 0, &mut out);
        assert!(matches!(result, Err(CryptoError::KeyDerivation(_))));
    }

    #[test]
    fn test_random_fills_buffer() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        RustCryptoProvider.fill_random(&mut a).unwrap();
        RustCryptoProvider.fill_random(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_gcm_tag_is_appended() {
        let key = [7u8; KEY_SIZE];
        let nonce = [1u8; NONCE_SIZE];
        let sealed = RustCryptoProvider
            .aes256gcm_seal(&key, &nonce, b"twelve bytes")
            .unwrap();
        assert_eq!(sealed.len(), 12 + crate::TAG_SIZE);
    }

    #[test]
    fn test_gcm_open_short_input_is_authentication_error() {
        let key = [7u8; KEY_SIZE];
        let nonce = [1u8; NONCE_SIZE];
        let result = RustCryptoProvider.aes256gcm_open(&key, &nonce, &[0u8; 5]);
        assert!(matches!(result, Err(CryptoError::Authentication)));
    }
}
