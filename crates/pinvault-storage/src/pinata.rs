//! Pinata pinning API + IPFS gateway adapter
//!
//! Store: `POST {api_url}/pinning/pinFileToIPFS` (multipart `file` + `pinataMetadata`)
//! Fetch: `GET {gateway_url}/{cid}`

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use pinvault_core::{ContentAddress, LogicalFile};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use crate::store::{ContentStore, FetchError, FetchedObject, StoreError};

/// Pinata credentials: either an API key pair or a JWT.
#[derive(Debug, Clone)]
pub enum PinataAuth {
    ApiKey { key: String, secret: SecretString },
    Jwt(SecretString),
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: Option<String>,
    #[serde(rename = "PinSize")]
    pin_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct PinataStore {
    client: Client,
    api_url: String,
    gateway_url: String,
    auth: PinataAuth,
}

impl PinataStore {
    pub fn new(api_url: &str, gateway_url: &str, auth: PinataAuth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pinvault/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            PinataAuth::ApiKey { key, secret } => request
                .header("pinata_api_key", key)
                .header("pinata_secret_api_key", secret.expose_secret()),
            PinataAuth::Jwt(token) => request.bearer_auth(token.expose_secret()),
        }
    }
}

#[async_trait]
impl ContentStore for PinataStore {
    async fn store(&self, file: LogicalFile) -> Result<ContentAddress, StoreError> {
        let url = format!("{}/pinning/pinFileToIPFS", self.api_url);
        let size = file.content.len();

        let mut part = Part::bytes(file.content.to_vec()).file_name(file.name.clone());
        if let Some(mime) = &file.mime_hint {
            part = part
                .mime_str(mime)
                .map_err(|e| StoreError::Transport(format!("invalid mime type {mime}: {e}")))?;
        }
        let metadata = serde_json::json!({ "name": file.name }).to_string();
        let form = Form::new()
            .part("file", part)
            .text("pinataMetadata", metadata);

        debug!(name = %file.name, bytes = size, "pinning file");
        let response = self
            .authorize(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        let pinned: PinResponse = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedResponse(e.to_string()))?;

        let hash = pinned
            .ipfs_hash
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| StoreError::MalformedResponse("response has no IpfsHash".into()))?;
        let address = ContentAddress::new(hash)
            .map_err(|e| StoreError::MalformedResponse(e.to_string()))?;

        info!(cid = %address, pin_size = ?pinned.pin_size, "pinned");
        Ok(address)
    }

    async fn fetch(&self, address: &ContentAddress) -> Result<FetchedObject, FetchError> {
        let url = address.gateway_url(&self.gateway_url);
        debug!(%url, "fetching from gateway");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let headers = response.headers();
        let name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition);
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let content = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(FetchedObject {
            content,
            name,
            content_type,
        })
    }

    async fn check_health(&self) -> Result<(), StoreError> {
        let url = format!("{}/data/testAuthentication", self.api_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("pinata ({}, gateway {})", self.api_url, self.gateway_url)
    }

    fn share_url(&self, address: &ContentAddress) -> Option<String> {
        Some(address.gateway_url(&self.gateway_url))
    }
}

/// Pull the filename out of a `Content-Disposition` header value.
///
/// Prefers the RFC 5987 `filename*=UTF-8''...` form over plain `filename=`.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let Some(encoded) = raw.trim().splitn(3, '\'').nth(2) else {
                    continue;
                };
                if let Some(decoded) = percent_decode(encoded) {
                    if !decoded.is_empty() {
                        return Some(decoded);
                    }
                }
            }
            "filename" => {
                let name = raw.trim().trim_matches('"');
                if !name.is_empty() {
                    plain = Some(name.to_string());
                }
            }
            _ => {}
        }
    }
    plain
}

fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
