use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// The KDF primitive failed; never caused by password content
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// The input cannot be an envelope of the requested layout
    #[error("malformed envelope: {reason}")]
    Format { reason: &'static str },

    /// Tag mismatch, truncated ciphertext, or wrong key; never distinguished
    #[error("authentication failed")]
    Authentication,

    /// Sealing failed (plaintext beyond the GCM length limit)
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("random number generator failed: {0}")]
    Randomness(String),
}
