//! Password → envelope composition shared by upload and retrieval
//!
//! Seal: (salt) → derive → fresh nonce → AES-GCM → encode
//! Open: decode → derive → AES-GCM open
//!
//! Both directions are CPU-bound (PBKDF2) and synchronous; async callers
//! should move a clone of the vault onto a blocking thread.

use std::sync::Arc;

use tracing::debug;

use crate::cipher::Cipher;
use crate::envelope::{self, EnvelopeScheme};
use crate::error::CryptoError;
use crate::kdf::{KdfParams, KeyDeriver, Password};
use crate::provider::CryptoProvider;
use crate::{LEGACY_SALT, SALT_SIZE};

#[derive(Debug, Clone)]
pub struct Vault {
    provider: Arc<dyn CryptoProvider>,
    deriver: KeyDeriver,
    cipher: Cipher,
    scheme: EnvelopeScheme,
}

impl Vault {
    pub fn new(provider: Arc<dyn CryptoProvider>, params: KdfParams, scheme: EnvelopeScheme) -> Self {
        Self {
            deriver: KeyDeriver::new(provider.clone(), params),
            cipher: Cipher::new(provider.clone()),
            provider,
            scheme,
        }
    }

    pub fn scheme(&self) -> EnvelopeScheme {
        self.scheme
    }

    /// Encrypt `plaintext` under `password` and return the full envelope.
    ///
    /// Consumes the password; it is zeroized once the key exists.
    pub fn seal(&self, password: Password, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self.scheme {
            EnvelopeScheme::Legacy => {
                let key = self.deriver.derive(&password, LEGACY_SALT)?;
                drop(password);
                let nonce = self.cipher.generate_nonce()?;
                let ciphertext = self.cipher.seal(&key, &nonce, plaintext)?;
                debug!(scheme = %self.scheme, bytes = plaintext.len(), "sealed envelope");
                Ok(envelope::encode(&nonce, &ciphertext))
            }
            EnvelopeScheme::Salted => {
                let mut salt = [0u8; SALT_SIZE];
                self.provider.fill_random(&mut salt)?;
                let key = self.deriver.derive(&password, &salt)?;
                drop(password);
                let nonce = self.cipher.generate_nonce()?;
                let ciphertext = self.cipher.seal(&key, &nonce, plaintext)?;
                debug!(scheme = %self.scheme, bytes = plaintext.len(), "sealed envelope");
                Ok(envelope::encode_salted(&salt, &nonce, &ciphertext))
            }
        }
    }

    /// Decode `envelope` and decrypt it under `password`.
    ///
    /// Layout problems surface as `Format` before any key is derived; every
    /// decryption failure is the single opaque `Authentication`.
    pub fn open(&self, password: Password, envelope: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let (salt, nonce, ciphertext) = match self.scheme {
            EnvelopeScheme::Legacy => {
                let (nonce, ciphertext) = envelope::decode(envelope)?;
                (LEGACY_SALT.to_vec(), nonce, ciphertext)
            }
            EnvelopeScheme::Salted => {
                let (salt, nonce, ciphertext) = envelope::decode_salted(envelope)?;
                (salt.to_vec(), nonce, ciphertext)
            }
        };

        let key = self.deriver.derive(&password, &salt)?;
        drop(password);
        self.cipher.open(&key, &nonce, ciphertext)
    }
}
