//! Storage health check

use anyhow::Result;

use crate::store::ContentStore;

/// Verify the store is reachable and the credentials are accepted
pub async fn check_health(store: &dyn ContentStore) -> Result<()> {
    store
        .check_health()
        .await
        .map_err(|e| anyhow::anyhow!("storage health check failed ({}): {e}", store.describe()))
}

/// Returns true if storage is reachable, false otherwise (non-panicking)
pub async fn is_healthy(store: &dyn ContentStore) -> bool {
    check_health(store).await.is_ok()
}
