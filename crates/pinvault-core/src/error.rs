use thiserror::Error;

pub type PinvaultResult<T> = Result<T, PinvaultError>;

#[derive(Debug, Error)]
pub enum PinvaultError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid content address: {0}")]
    InvalidAddress(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
