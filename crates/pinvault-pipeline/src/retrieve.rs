//! Retrieval: fetch, then optionally decode and open
//!
//! Nothing is returned to the caller before the final stage succeeds, so a
//! failed decryption never leaks partial plaintext.

use std::sync::Arc;

use pinvault_core::{ContentAddress, LogicalFile};
use pinvault_crypto::{
    decode, decode_salted, rename_for_decryption, EnvelopeScheme, Password, Vault,
};
use pinvault_storage::ContentStore;
use tracing::{debug, info, warn};

use crate::error::{RetrievalError, RetrievalStage};
use crate::policy::PasswordPolicy;

#[derive(Clone)]
pub struct RetrievalPipeline {
    store: Arc<dyn ContentStore>,
    vault: Vault,
    policy: PasswordPolicy,
}

fn advance(stage: &mut RetrievalStage, next: RetrievalStage, address: &ContentAddress) {
    debug!(%address, from = %stage, to = %next, "retrieval stage");
    *stage = next;
}

impl RetrievalPipeline {
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

    /// Fetch `address` and, if a password is given, decrypt it.
    ///
    /// The returned name is whatever the store served (or the address
    /// itself), minus the `.encrypted` suffix when decrypting. Every call
    /// fetches and derives afresh.
    pub async fn retrieve(
        &self,
        address: &ContentAddress,
        password: Option<Password>,
    ) -> Result<LogicalFile, RetrievalError> {
        let mut stage = RetrievalStage::Idle;

        if let Some(password) = &password {
            self.policy
                .check(password)
                .map_err(RetrievalError::PasswordRejected)?;
        }

        advance(&mut stage, RetrievalStage::Fetching, address);
        let fetched = match self.store.fetch(address).await {
            Ok(fetched) => fetched,
            Err(e) => {
                advance(&mut stage, RetrievalStage::FetchFailed, address);
                warn!(%address, "fetch failed: {e}");
                return Err(RetrievalError::FetchFailed(e));
            }
        };
        advance(&mut stage, RetrievalStage::Fetched, address);

        let stored_name = fetched
            .name
            .clone()
            .unwrap_or_else(|| address.to_string());

        let Some(password) = password else {
            info!(%address, name = %stored_name, bytes = fetched.content.len(), "retrieved");
            return Ok(LogicalFile {
                name: stored_name,
                content: fetched.content,
                mime_hint: fetched.content_type,
            });
        };

        advance(&mut stage, RetrievalStage::Decoding, address);
        let scheme = self.vault.scheme();
        let layout = match scheme {
            EnvelopeScheme::Legacy => decode(&fetched.content).map(|_| ()),
            EnvelopeScheme::Salted => decode_salted(&fetched.content).map(|_| ()),
        };
        if let Err(e) = layout {
            advance(&mut stage, RetrievalStage::DecodeFailed, address);
            return Err(RetrievalError::MalformedEnvelope(e));
        }
        advance(&mut stage, RetrievalStage::Decoded, address);

        advance(&mut stage, RetrievalStage::Opening, address);
        let vault = self.vault.clone();
        let envelope = fetched.content;
        let opened = tokio::task::spawn_blocking(move || vault.open(password, &envelope))
            .await
            .map_err(|e| RetrievalError::Worker(e.to_string()))
            .and_then(|r| r.map_err(RetrievalError::from));

        let plaintext = match opened {
            Ok(plaintext) => plaintext,
            Err(e) => {
                advance(&mut stage, e.stage(), address);
                warn!(%address, %scheme, "{}", e.cause());
                return Err(e);
            }
        };
        advance(&mut stage, RetrievalStage::Opened, address);

        let name = rename_for_decryption(&stored_name);
        let mime_hint = mime_guess::from_path(&name)
            .first()
            .map(|m| m.essence_str().to_string());

        info!(%address, %name, bytes = plaintext.len(), "retrieved and decrypted");
        Ok(LogicalFile {
            name,
            content: plaintext.into(),
            mime_hint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::UploadPipeline;
    use pinvault_crypto::{default_provider, KdfParams};
    use pinvault_storage::{build_memory_operator, OperatorStore};
    use secrecy::SecretString;

    fn pipelines(scheme: EnvelopeScheme) -> (UploadPipeline, RetrievalPipeline) {
        let store: Arc<dyn ContentStore> =
            Arc::new(OperatorStore::new(build_memory_operator().unwrap(), "t"));
        let vault = Vault::new(default_provider(), KdfParams { iterations: 1_000 }, scheme);
        (
            UploadPipeline::new(store.clone(), vault.clone()),
            RetrievalPipeline::new(store, vault),
        )
    }

    #[tokio::test]
    async fn decrypt_restores_name_and_guesses_mime() {
        let (up, down) = pipelines(EnvelopeScheme::Salted);
        let address = up
            .upload(
                LogicalFile::new("photo.png", b"not really a png".to_vec()),
                Some(SecretString::from("pw")),
            )
            .await
            .unwrap();

        let file = down
            .retrieve(&address, Some(SecretString::from("pw")))
            .await
            .unwrap();
        assert_eq!(file.name, "photo.png");
        assert_eq!(file.content.as_ref(), b"not really a png");
        assert_eq!(file.mime_hint.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn plain_retrieve_returns_envelope_verbatim() {
        let (up, down) = pipelines(EnvelopeScheme::Legacy);
        let address = up
            .upload(
                LogicalFile::new("a.txt", b"secret".to_vec()),
                Some(SecretString::from("pw")),
            )
            .await
            .unwrap();

        let raw = down.retrieve(&address, None).await.unwrap();
        assert_eq!(raw.name, "a.txt.encrypted");
        assert_eq!(raw.content.len(), 12 + 6 + 16);
        assert_eq!(raw.mime_hint.as_deref(), Some("application/encrypted"));
    }

    #[tokio::test]
    async fn short_content_is_malformed_before_decryption() {
        let (up, down) = pipelines(EnvelopeScheme::Salted);
        let address = up
            .upload(LogicalFile::new("tiny.bin", vec![0u8; 20]), None)
            .await
            .unwrap();

        let err = down
            .retrieve(&address, Some(SecretString::from("pw")))
            .await
            .unwrap_err();
        assert_eq!(err.cause(), "malformed envelope");
        assert_eq!(err.stage(), RetrievalStage::DecodeFailed);
        assert_eq!(err.to_string(), "malformed envelope: too short");
    }

    #[tokio::test]
    async fn plaintext_file_fails_to_open() {
        let (up, down) = pipelines(EnvelopeScheme::Legacy);
        let address = up
            .upload(LogicalFile::new("readme.md", vec![b'#'; 64]), None)
            .await
            .unwrap();

        let err = down
            .retrieve(&address, Some(SecretString::from("pw")))
            .await
            .unwrap_err();
        assert_eq!(err.cause(), "wrong password or corrupted ciphertext");
        assert_eq!(err.stage(), RetrievalStage::OpenFailed);
    }

    #[tokio::test]
    async fn empty_password_rejected_before_fetch() {
        let (_, down) = pipelines(EnvelopeScheme::Salted);
        let address = ContentAddress::new("anything").unwrap();
        let err = down
            .retrieve(&address, Some(SecretString::from("")))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), RetrievalStage::Idle);
    }
}
