use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{PinvaultError, PinvaultResult};

/// A named blob moving through the upload/retrieval pipelines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalFile {
    pub name: String,
    pub content: Bytes,
    /// MIME type hint, if known (e.g. `application/encrypted` for envelopes)
    pub mime_hint: Option<String>,
}

impl LogicalFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            mime_hint: None,
        }
    }

    pub fn with_mime_hint(mut self, mime: impl Into<String>) -> Self {
        self.mime_hint = Some(mime.into());
        self
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Opaque identifier handed out by a content-addressed store.
///
/// Not interpreted beyond trimming; whatever the store returned is what
/// gets passed back on fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentAddress(String);

impl ContentAddress {
    pub fn new(raw: impl Into<String>) -> PinvaultResult<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PinvaultError::InvalidAddress("empty address".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Accept either a bare identifier or a gateway URL such as
    /// `https://gateway.example/ipfs/<cid>?filename=x`.
    ///
    /// For URLs the identifier is the text after the last `ipfs/` segment,
    /// with any query, fragment or trailing slash removed.
    pub fn from_reference(input: &str) -> PinvaultResult<Self> {
        let input = input.trim();
        let Some(idx) = input.rfind("ipfs/") else {
            return Self::new(input);
        };

        let tail = &input[idx + "ipfs/".len()..];
        let tail = tail.split(['?', '#']).next().unwrap_or_default();
        let tail = tail.trim_end_matches('/');
        let cid = tail.split('/').next().unwrap_or_default();
        if cid.is_empty() {
            return Err(PinvaultError::InvalidAddress(format!(
                "no identifier after ipfs/ in {input}"
            )));
        }
        Self::new(cid)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<gateway-base>/<address>`
    pub fn gateway_url(&self, gateway_base: &str) -> String {
        format!("{}/{}", gateway_base.trim_end_matches('/'), self.0)
    }
}

impl std::fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
