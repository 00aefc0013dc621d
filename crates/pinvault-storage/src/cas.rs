//! BLAKE3-addressed store over an OpenDAL operator
//!
//! Layout under `{prefix}`:
//!   blobs/{blake3-hex}        raw content
//!   meta/{blake3-hex}.json    name + content type recorded at store time
//!
//! The address is the BLAKE3 hash of the stored bytes, so every fetch is
//! verified against it before the bytes leave this module.

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{ErrorKind, Operator};
use pinvault_core::{ContentAddress, LogicalFile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::store::{ContentStore, FetchError, FetchedObject, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobMeta {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    size: u64,
    stored_at: u64,
}

#[derive(Debug, Clone)]
pub struct OperatorStore {
    op: Operator,
    prefix: String,
}

impl OperatorStore {
    pub fn new(op: Operator, prefix: &str) -> Self {
        Self {
            op,
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    fn blob_key(&self, hex: &str) -> String {
        format!("{}/blobs/{hex}", self.prefix)
    }

    fn meta_key(&self, hex: &str) -> String {
        format!("{}/meta/{hex}.json", self.prefix)
    }

    async fn read_meta(&self, hex: &str) -> Option<BlobMeta> {
        let key = self.meta_key(hex);
        match self.op.read(&key).await {
            Ok(buf) => match serde_json::from_slice(&buf.to_bytes()) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    warn!(%key, "ignoring unreadable metadata: {e}");
                    None
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(%key, "reading metadata failed: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl ContentStore for OperatorStore {
    async fn store(&self, file: LogicalFile) -> Result<ContentAddress, StoreError> {
        let hex = blake3::hash(&file.content).to_hex().to_string();
        let blob_key = self.blob_key(&hex);
        let size = file.content.len() as u64;

        // Same bytes, same address: skip the blob write if already present
        let exists = self
            .op
            .exists(&blob_key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        if !exists {
            self.op
                .write(&blob_key, file.content.clone())
                .await
                .map_err(|e| StoreError::Backend(format!("writing {blob_key}: {e}")))?;
        }

        let meta = BlobMeta {
            name: file.name.clone(),
            content_type: file.mime_hint.clone(),
            size,
            stored_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };
        let meta_bytes =
            serde_json::to_vec(&meta).map_err(|e| StoreError::Backend(e.to_string()))?;
        let meta_key = self.meta_key(&hex);
        self.op
            .write(&meta_key, meta_bytes)
            .await
            .map_err(|e| StoreError::Backend(format!("writing {meta_key}: {e}")))?;

        info!(address = %hex, name = %file.name, bytes = size, dedup = exists, "stored blob");
        ContentAddress::new(hex).map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn fetch(&self, address: &ContentAddress) -> Result<FetchedObject, FetchError> {
        // Anything that is not a BLAKE3 hex digest cannot name a blob here
        let expected = blake3::Hash::from_hex(address.as_str())
            .map_err(|_| FetchError::NotFound(address.to_string()))?;
        let hex = expected.to_hex().to_string();
        let blob_key = self.blob_key(&hex);

        let content: Bytes = match self.op.read(&blob_key).await {
            Ok(buf) => buf.to_bytes(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FetchError::NotFound(address.to_string()))
            }
            Err(e) => return Err(FetchError::Backend(format!("reading {blob_key}: {e}"))),
        };

        if blake3::hash(&content) != expected {
            return Err(FetchError::Integrity(address.to_string()));
        }

        let meta = self.read_meta(&hex).await;
        debug!(address = %hex, bytes = content.len(), has_meta = meta.is_some(), "fetched blob");

        Ok(FetchedObject {
            content,
            name: meta.as_ref().map(|m| m.name.clone()),
            content_type: meta.and_then(|m| m.content_type),
        })
    }

    async fn check_health(&self) -> Result<(), StoreError> {
        self.op
            .list("/")
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Backend(format!("storage health check failed: {e}")))
    }

    fn describe(&self) -> String {
        let info = self.op.info();
        format!(
            "{} ({}{}, prefix {})",
            info.scheme(),
            info.name(),
            info.root(),
            self.prefix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{build_fs_operator, build_memory_operator};

    fn memory_store() -> OperatorStore {
        OperatorStore::new(build_memory_operator().expect("memory operator"), "pinvault")
    }

    #[tokio::test]
    async fn store_then_fetch_returns_bytes_and_name() {
        let store = memory_store();
        let file = LogicalFile::new("report.pdf.encrypted", b"envelope bytes".to_vec())
            .with_mime_hint("application/encrypted");

        let address = store.store(file).await.unwrap();
        assert_eq!(address.as_str(), blake3::hash(b"envelope bytes").to_hex().as_str());

        let fetched = store.fetch(&address).await.unwrap();
        assert_eq!(fetched.content.as_ref(), b"envelope bytes");
        assert_eq!(fetched.name.as_deref(), Some("report.pdf.encrypted"));
        assert_eq!(fetched.content_type.as_deref(), Some("application/encrypted"));
    }

    #[tokio::test]
    async fn identical_content_gets_identical_address() {
        let store = memory_store();
        let a = store.store(LogicalFile::new("a.txt", b"same".to_vec())).await.unwrap();
        let b = store.store(LogicalFile::new("b.txt", b"same".to_vec())).await.unwrap();
        assert_eq!(a, b);

        // Last writer's name wins for the sidecar
        let fetched = store.fetch(&a).await.unwrap();
        assert_eq!(fetched.name.as_deref(), Some("b.txt"));
    }

    #[tokio::test]
    async fn empty_file_roundtrips() {
        let store = memory_store();
        let address = store.store(LogicalFile::new("empty", Vec::new())).await.unwrap();
        let fetched = store.fetch(&address).await.unwrap();
        assert!(fetched.content.is_empty());
    }

    #[tokio::test]
    async fn unknown_address_is_not_found() {
        let store = memory_store();
        let missing = ContentAddress::new(blake3::hash(b"never stored").to_hex().to_string()).unwrap();
        assert!(matches!(store.fetch(&missing).await, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn non_hash_address_is_not_found() {
        let store = memory_store();
        for raw in ["QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG", "../../etc/passwd"] {
            let address = ContentAddress::new(raw).unwrap();
            assert!(matches!(store.fetch(&address).await, Err(FetchError::NotFound(_))));
        }
    }

    #[tokio::test]
    async fn tampered_blob_fails_integrity() {
        let op = build_memory_operator().unwrap();
        let store = OperatorStore::new(op.clone(), "pinvault");
        let address = store
            .store(LogicalFile::new("a.txt", b"original".to_vec()))
            .await
            .unwrap();

        op.write(&format!("pinvault/blobs/{}", address.as_str()), b"tampered".to_vec())
            .await
            .unwrap();

        assert!(matches!(store.fetch(&address).await, Err(FetchError::Integrity(_))));
    }

    #[tokio::test]
    async fn missing_sidecar_still_serves_content() {
        let op = build_memory_operator().unwrap();
        let store = OperatorStore::new(op.clone(), "pinvault");
        let address = store
            .store(LogicalFile::new("a.txt", b"content".to_vec()))
            .await
            .unwrap();
        op.delete(&format!("pinvault/meta/{}.json", address.as_str()))
            .await
            .unwrap();

        let fetched = store.fetch(&address).await.unwrap();
        assert_eq!(fetched.content.as_ref(), b"content");
        assert!(fetched.name.is_none());
    }

    #[tokio::test]
    async fn fs_backend_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let address = {
            let store = OperatorStore::new(build_fs_operator(dir.path()).unwrap(), "pv");
            store
                .store(LogicalFile::new("notes.txt", b"persisted".to_vec()))
                .await
                .unwrap()
        };

        let reopened = OperatorStore::new(build_fs_operator(dir.path()).unwrap(), "pv");
        let fetched = reopened.fetch(&address).await.unwrap();
        assert_eq!(fetched.content.as_ref(), b"persisted");
        assert!(dir
            .path()
            .join("pv/blobs")
            .join(address.as_str())
            .exists());
    }

    #[tokio::test]
    async fn health_check_on_memory_backend() {
        memory_store().check_health().await.unwrap();
    }
}
