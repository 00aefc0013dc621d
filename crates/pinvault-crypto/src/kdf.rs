//! Key derivation: PBKDF2-HMAC-SHA256 password → 256-bit AES key

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::provider::CryptoProvider;
use crate::{DEFAULT_ITERATIONS, KEY_SIZE};

/// A user-supplied password. Redacted in `Debug`, zeroized on drop.
pub type Password = SecretString;

/// A 256-bit key derived from a password.
///
/// Zeroized on drop. Not `Clone`: each encrypt/decrypt call derives and
/// consumes its own.
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// PBKDF2 parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Round count (default: 100,000). Writer and reader must agree.
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Turns passwords into keys through an injected provider.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    provider: Arc<dyn CryptoProvider>,
    params: KdfParams,
}

impl KeyDeriver {
    pub fn new(provider: Arc<dyn CryptoProvider>, params: KdfParams) -> Self {
        Self { provider, params }
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Derive a 256-bit key from `password` and `salt`.
    ///
    /// Deterministic for a given (password, salt, iterations). Any password
    /// is accepted here, including the empty one; length policy belongs to
    /// the caller. Slow by construction; run it off the async executor.
    pub fn derive(&self, password: &Password, salt: &[u8]) -> Result<DerivedKey, CryptoError> {
        let mut key = [0u8; KEY_SIZE];
        let result = self.provider.pbkdf2_sha256(
            password.expose_secret().as_bytes(),
            salt,
            self.params.iterations,
            &mut key,
        );
        if let Err(e) = result {
            key.zeroize();
            return Err(e);
        }
        Ok(DerivedKey::from_bytes(key))
    }
}
