use pinvault_crypto::CryptoError;
use pinvault_storage::{FetchError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("password rejected: {0}")]
    PasswordRejected(String),

    #[error("encryption failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("upload failed: {0}")]
    Store(#[from] StoreError),

    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Where a retrieval stopped. Failures are terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStage {
    Idle,
    Fetching,
    FetchFailed,
    Fetched,
    Decoding,
    DecodeFailed,
    Decoded,
    Opening,
    OpenFailed,
    Opened,
}

impl std::fmt::Display for RetrievalStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RetrievalStage::Idle => "idle",
            RetrievalStage::Fetching => "fetching",
            RetrievalStage::FetchFailed => "fetch-failed",
            RetrievalStage::Fetched => "fetched",
            RetrievalStage::Decoding => "decoding",
            RetrievalStage::DecodeFailed => "decode-failed",
            RetrievalStage::Decoded => "decoded",
            RetrievalStage::Opening => "opening",
            RetrievalStage::OpenFailed => "open-failed",
            RetrievalStage::Opened => "opened",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("password rejected: {0}")]
    PasswordRejected(String),

    #[error("fetch failed: {0}")]
    FetchFailed(#[source] FetchError),

    /// Displays as the codec's own `malformed envelope: <reason>`
    #[error("{0}")]
    MalformedEnvelope(#[source] CryptoError),

    /// Wrong password and corrupted ciphertext are indistinguishable
    #[error("wrong password or corrupted ciphertext")]
    Decryption,

    /// KDF or RNG failure unrelated to the password
    #[error("decryption failed: {0}")]
    Crypto(#[source] CryptoError),

    #[error("worker task failed: {0}")]
    Worker(String),
}

impl RetrievalError {
    /// Short stable cause string
    pub fn cause(&self) -> &'static str {
        match self {
            RetrievalError::PasswordRejected(_) => "password rejected",
            RetrievalError::FetchFailed(_) => "fetch failed",
            RetrievalError::MalformedEnvelope(_) => "malformed envelope",
            RetrievalError::Decryption => "wrong password or corrupted ciphertext",
            RetrievalError::Crypto(_) | RetrievalError::Worker(_) => "internal error",
        }
    }

    /// Message suitable for showing to an end user
    pub fn user_message(&self) -> &'static str {
        match self {
            RetrievalError::PasswordRejected(_) => "password rejected",
            RetrievalError::FetchFailed(_) => "could not reach storage",
            RetrievalError::MalformedEnvelope(_) => "not a valid encrypted file",
            RetrievalError::Decryption
            | RetrievalError::Crypto(_)
            | RetrievalError::Worker(_) => "decryption failed (check password)",
        }
    }

    pub fn stage(&self) -> RetrievalStage {
        match self {
            RetrievalError::PasswordRejected(_) => RetrievalStage::Idle,
            RetrievalError::FetchFailed(_) => RetrievalStage::FetchFailed,
            RetrievalError::MalformedEnvelope(_) => RetrievalStage::DecodeFailed,
            RetrievalError::Decryption
            | RetrievalError::Crypto(_)
            | RetrievalError::Worker(_) => RetrievalStage::OpenFailed,
        }
    }
}

impl From<CryptoError> for RetrievalError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Format { .. } => RetrievalError::MalformedEnvelope(err),
            CryptoError::Authentication => RetrievalError::Decryption,
            other => RetrievalError::Crypto(other),
        }
    }
}
