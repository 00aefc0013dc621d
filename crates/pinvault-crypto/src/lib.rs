//! pinvault-crypto: password-derived envelopes for files published to
//! content-addressed storage
//!
//! Pipeline: password → PBKDF2-HMAC-SHA256 → AES-256-GCM seal → envelope → `<name>.encrypted`
//!
//! Envelope layouts:
//! ```text
//! legacy: [12 bytes: nonce][N bytes: ciphertext][16 bytes: GCM tag]     salt = "secure-salt"
//! salted: [16 bytes: salt][12 bytes: nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! Neither layout carries a version byte; the reader picks the scheme.

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod names;
pub mod provider;
pub mod vault;

pub use cipher::{Cipher, Nonce};
pub use envelope::{decode, decode_salted, encode, encode_salted, EnvelopeScheme};
pub use error::CryptoError;
pub use kdf::{DerivedKey, KdfParams, KeyDeriver, Password};
pub use names::{is_encrypted_name, rename_for_decryption, rename_for_encryption};
pub use provider::{default_provider, CryptoProvider, RustCryptoProvider};
pub use vault::Vault;

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of the per-file salt in the salted layout
pub const SALT_SIZE: usize = 16;

/// Default PBKDF2 round count
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Salt shared by every legacy envelope
pub const LEGACY_SALT: &[u8] = b"secure-salt";

/// Suffix appended to the filename of an encrypted file
pub const ENCRYPTED_SUFFIX: &str = ".encrypted";

/// MIME type attached to uploaded envelopes
pub const ENCRYPTED_MIME: &str = "application/encrypted";
