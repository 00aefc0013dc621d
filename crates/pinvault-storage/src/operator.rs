//! OpenDAL Operator factory for the BLAKE3-addressed backends

use std::path::Path;

use anyhow::{Context, Result};
use opendal::Operator;

/// Minimal S3 settings needed to build an operator
/// (full config lives in pinvault-core's StorageConfig)
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Build an OpenDAL Operator for any S3-compatible endpoint
///
/// Path-style addressing is the opendal 0.55 default, which SeaweedFS and
/// MinIO require.
pub fn build_s3_operator(cfg: &S3Config) -> Result<Operator> {
    let builder = opendal::services::S3::default()
        .endpoint(&cfg.endpoint)
        .region(&cfg.region)
        .bucket(&cfg.bucket)
        .access_key_id(&cfg.access_key_id)
        .secret_access_key(&cfg.secret_access_key);

    let op = Operator::new(builder)
        .context("creating OpenDAL S3 operator")?
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(5)
                .with_jitter(),
        )
        .finish();

    Ok(op)
}

/// Build an operator rooted at a local directory
pub fn build_fs_operator(root: &Path) -> Result<Operator> {
    let root = root
        .to_str()
        .with_context(|| format!("store root is not valid UTF-8: {}", root.display()))?;
    let builder = opendal::services::Fs::default().root(root);

    let op = Operator::new(builder)
        .context("creating OpenDAL fs operator")?
        .layer(opendal::layers::LoggingLayer::default())
        .finish();

    Ok(op)
}

/// In-process operator; contents vanish with the process
pub fn build_memory_operator() -> Result<Operator> {
    let op = Operator::new(opendal::services::Memory::default())
        .context("creating OpenDAL memory operator")?
        .finish();
    Ok(op)
}

/// Check an HTTP(S) endpoint against the TLS policy.
///
/// With `enforce_tls` a plaintext `http://` endpoint is an error; otherwise
/// it is allowed with a warning.
pub fn check_endpoint_tls(label: &str, endpoint: &str, enforce_tls: bool) -> Result<()> {
    if endpoint.starts_with("http://") {
        if enforce_tls {
            anyhow::bail!(
                "{label} endpoint uses plaintext HTTP ({endpoint}), but enforce_tls is enabled. \
                 Use an HTTPS endpoint or set storage.enforce_tls = false for local development."
            );
        }
        tracing::warn!(
            endpoint = %endpoint,
            "{label} endpoint uses plaintext HTTP, credentials and content travel unencrypted. \
             Set storage.enforce_tls = true and use HTTPS in production."
        );
    }
    Ok(())
}

/// Build an S3 operator from pinvault-core config + loaded credentials.
pub fn build_from_core_config(
    storage: &pinvault_core::config::StorageConfig,
    access_key_id: &str,
    secret_access_key: &str,
) -> Result<Operator> {
    check_endpoint_tls("S3", &storage.s3_endpoint, storage.enforce_tls)?;

    build_s3_operator(&S3Config {
        endpoint: storage.s3_endpoint.clone(),
        region: storage.s3_region.clone(),
        bucket: storage.s3_bucket.clone(),
        access_key_id: access_key_id.to_string(),
        secret_access_key: secret_access_key.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_s3_operator_valid() {
        let cfg = S3Config {
            endpoint: "http://localhost:8333".to_string(),
            region: "us-east-1".to_string(),
            bucket: "test-bucket".to_string(),
            access_key_id: "test-key".to_string(),
            secret_access_key: "test-secret".to_string(),
        };
        assert!(build_s3_operator(&cfg).is_ok());
    }

    #[test]
    fn test_build_fs_operator() {
        let dir = tempfile::tempdir().unwrap();
        assert!(build_fs_operator(dir.path()).is_ok());
    }

    #[test]
    fn test_build_memory_operator() {
        assert!(build_memory_operator().is_ok());
    }

    #[test]
    fn test_http_endpoint_allowed_without_enforce_tls() {
        let storage = pinvault_core::config::StorageConfig {
            s3_endpoint: "http://localhost:8333".into(),
            enforce_tls: false,
            ..Default::default()
        };
        assert!(build_from_core_config(&storage, "key", "secret").is_ok());
    }

    #[test]
    fn test_http_endpoint_rejected_with_enforce_tls() {
        let storage = pinvault_core::config::StorageConfig {
            s3_endpoint: "http://insecure:8333".into(),
            enforce_tls: true,
            ..Default::default()
        };
        let result = build_from_core_config(&storage, "key", "secret");
        assert!(result.is_err(), "HTTP + enforce_tls must fail");
        assert!(result.unwrap_err().to_string().contains("enforce_tls"));
    }

    #[test]
    fn test_https_endpoint_with_enforce_tls() {
        let storage = pinvault_core::config::StorageConfig {
            s3_endpoint: "https://s3.example.com:8333".into(),
            enforce_tls: true,
            ..Default::default()
        };
        assert!(build_from_core_config(&storage, "key", "secret").is_ok());
    }

    #[test]
    fn test_check_endpoint_tls_https_always_ok() {
        assert!(check_endpoint_tls("Pinata", "https://api.pinata.cloud", true).is_ok());
        assert!(check_endpoint_tls("Pinata", "http://127.0.0.1:1234", false).is_ok());
        assert!(check_endpoint_tls("Pinata", "http://127.0.0.1:1234", true).is_err());
    }
}
