use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PinvaultError, PinvaultResult};

/// Top-level configuration (loaded from pinvault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PinvaultConfig {
    pub log: LogConfig,
    pub storage: StorageConfig,
    pub crypto: CryptoConfig,
}

impl PinvaultConfig {
    /// Read and parse a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> PinvaultResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| PinvaultError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> PinvaultResult<Self> {
        toml::from_str(content).map_err(|e| PinvaultError::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

/// Which content-addressed store to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Pinata pinning API + IPFS gateway
    Pinata,
    /// Local directory, BLAKE3-addressed
    Fs,
    /// S3-compatible bucket, BLAKE3-addressed
    S3,
    /// In-process memory (tests and dry runs)
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Pinning API base URL
    pub api_url: String,
    /// Gateway base URL; content is served at `{gateway_url}/{address}`
    pub gateway_url: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Root directory for the fs backend
    pub fs_root: PathBuf,
    /// S3 endpoint for the s3 backend
    pub s3_endpoint: String,
    /// S3 region (default: us-east-1)
    pub s3_region: String,
    /// S3 bucket name
    pub s3_bucket: String,
    /// Key prefix for blobs in fs/s3/memory backends
    pub prefix: String,
    /// Refuse plaintext HTTP endpoints instead of warning
    pub enforce_tls: bool,
}

/// Envelope encryption configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Envelope layout: "salted" (per-file salt header) or "legacy" (fixed salt)
    pub scheme: String,
    /// PBKDF2-HMAC-SHA256 rounds; readers must use the writer's value
    pub pbkdf2_iterations: u32,
    /// Shortest password the pipelines accept
    pub min_password_len: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Pinata,
            api_url: "https://api.pinata.cloud".into(),
            gateway_url: "https://gateway.pinata.cloud/ipfs".into(),
            timeout_secs: 60,
            fs_root: PathBuf::from("~/.local/share/pinvault/store"),
            s3_endpoint: "http://localhost:8333".into(),
            s3_region: "us-east-1".into(),
            s3_bucket: "pinvault".into(),
            prefix: "pinvault".into(),
            enforce_tls: false,
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            scheme: "salted".into(),
            pbkdf2_iterations: 100_000,
            min_password_len: 1,
        }
    }
}
