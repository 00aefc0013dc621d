pub mod config;
pub mod error;
pub mod types;

pub use error::{PinvaultError, PinvaultResult};
pub use types::{ContentAddress, LogicalFile};
