//! pinvault-storage: content-addressed stores behind one async trait
//!
//! - [`PinataStore`]: Pinata pinning API, fetched back through an IPFS gateway
//! - [`OperatorStore`]: BLAKE3-addressed blobs on any OpenDAL operator (fs, s3, memory)

pub mod cas;
pub mod health;
pub mod operator;
pub mod pinata;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pinvault_core::config::{StorageBackend, StorageConfig};

pub use cas::OperatorStore;
pub use health::{check_health, is_healthy};
pub use operator::{build_fs_operator, build_memory_operator, build_s3_operator, S3Config};
pub use pinata::{PinataAuth, PinataStore};
pub use store::{ContentStore, FetchError, FetchedObject, StoreError};

/// Credentials loaded from the environment, resolved per backend
#[derive(Debug, Clone, Default)]
pub struct StoreCredentials {
    pub pinata: Option<PinataAuth>,
    /// (access_key_id, secret_access_key)
    pub s3: Option<(String, String)>,
}

/// Build the configured store.
///
/// `fs_root` is used as given; tilde expansion is the caller's job.
pub fn build_store(cfg: &StorageConfig, creds: StoreCredentials) -> Result<Arc<dyn ContentStore>> {
    match cfg.backend {
        StorageBackend::Pinata => {
            let auth = creds.pinata.context(
                "Pinata credentials not found: set PINATA_JWT, or PINATA_API_KEY and PINATA_API_SECRET",
            )?;
            operator::check_endpoint_tls("Pinata API", &cfg.api_url, cfg.enforce_tls)?;
            operator::check_endpoint_tls("gateway", &cfg.gateway_url, cfg.enforce_tls)?;
            let store = PinataStore::new(
                &cfg.api_url,
                &cfg.gateway_url,
                auth,
                Duration::from_secs(cfg.timeout_secs),
            )?;
            Ok(Arc::new(store))
        }
        StorageBackend::Fs => {
            std::fs::create_dir_all(&cfg.fs_root)
                .with_context(|| format!("creating store root {}", cfg.fs_root.display()))?;
            let op = build_fs_operator(&cfg.fs_root)?;
            Ok(Arc::new(OperatorStore::new(op, &cfg.prefix)))
        }
        StorageBackend::S3 => {
            let (access, secret) = creds
                .s3
                .context("S3 credentials not found: set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY")?;
            let op = operator::build_from_core_config(cfg, &access, &secret)?;
            Ok(Arc::new(OperatorStore::new(op, &cfg.prefix)))
        }
        StorageBackend::Memory => {
            let op = build_memory_operator()?;
            Ok(Arc::new(OperatorStore::new(op, &cfg.prefix)))
        }
    }
}
