//! The content-addressed store seam
//!
//! Pipelines only see `ContentStore`. Each adapter decides how addresses are
//! minted; callers treat them as opaque.

use async_trait::async_trait;
use bytes::Bytes;
use pinvault_core::{ContentAddress, LogicalFile};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("storage returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed storage response: {0}")]
    MalformedResponse(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },

    #[error("no object at address {0}")]
    NotFound(String),

    #[error("content at {0} does not match its address")]
    Integrity(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Bytes served for an address, plus whatever naming metadata came with them.
#[derive(Debug, Clone)]
pub struct FetchedObject {
    pub content: Bytes,
    /// Filename as recorded at store time, if the backend serves one
    pub name: Option<String>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Publish one file. One publish per call, no retries.
    async fn store(&self, file: LogicalFile) -> Result<ContentAddress, StoreError>;

    /// Fetch the bytes behind `address`.
    async fn fetch(&self, address: &ContentAddress) -> Result<FetchedObject, FetchError>;

    /// Cheapest request that proves the backend is reachable and authorized.
    async fn check_health(&self) -> Result<(), StoreError>;

    /// Human-readable backend description for logs and status output
    fn describe(&self) -> String;

    /// Public URL where `address` can be downloaded, if the backend has one
    fn share_url(&self, _address: &ContentAddress) -> Option<String> {
        None
    }
}
