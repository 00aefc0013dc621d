//! Upload: optionally seal, then publish exactly once

use std::sync::Arc;

use pinvault_core::{ContentAddress, LogicalFile};
use pinvault_crypto::{rename_for_encryption, Password, Vault, ENCRYPTED_MIME};
use pinvault_storage::ContentStore;
use tracing::{debug, info};

use crate::error::UploadError;
use crate::policy::PasswordPolicy;

#[derive(Clone)]
pub struct UploadPipeline {
    store: Arc<dyn ContentStore>,
    vault: Vault,
    policy: PasswordPolicy,
}

impl UploadPipeline {
    pub fn new(store: Arc<dyn ContentStore>, vault: Vault) -> Self {
        Self {
            store,
            vault,
            policy: PasswordPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Publish `file`, encrypted under `password` if one is given.
    ///
    /// With a password the stored object is the envelope, named
    /// `<name>.encrypted` with MIME type `application/encrypted`. The
    /// password is consumed and dropped once the key is derived.
    pub async fn upload(
        &self,
        file: LogicalFile,
        password: Option<Password>,
    ) -> Result<ContentAddress, UploadError> {
        let prepared = match password {
            None => file,
            Some(password) => {
                self.policy
                    .check(&password)
                    .map_err(UploadError::PasswordRejected)?;

                let vault = self.vault.clone();
                let plaintext = file.content.clone();
                let envelope =
                    tokio::task::spawn_blocking(move || vault.seal(password, &plaintext))
                        .await
                        .map_err(|e| UploadError::Worker(e.to_string()))??;

                debug!(
                    name = %file.name,
                    plaintext = file.len(),
                    envelope = envelope.len(),
                    scheme = %self.vault.scheme(),
                    "sealed file"
                );
                LogicalFile::new(rename_for_encryption(&file.name), envelope)
                    .with_mime_hint(ENCRYPTED_MIME)
            }
        };

        let name = prepared.name.clone();
        let bytes = prepared.len();
        let address = self.store.store(prepared).await?;

        info!(%name, bytes, address = %address, "upload complete");
        Ok(address)
    }
}
