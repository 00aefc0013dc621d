//! pinvault-pipeline: the two end-to-end flows
//!
//! Upload:   [policy] → seal (blocking pool) → rename → store
//! Retrieve: fetch → [policy] → decode → open (blocking pool) → rename
//!
//! Both pipelines hold only immutable handles (`Arc<dyn ContentStore>`,
//! `Vault`) and can be cloned freely across tasks.

pub mod error;
pub mod policy;
pub mod retrieve;
pub mod upload;

pub use error::{RetrievalError, RetrievalStage, UploadError};
pub use policy::PasswordPolicy;
pub use retrieve::RetrievalPipeline;
pub use upload::UploadPipeline;
