use thiserror::Error;

/// Shared error type for all bridge traits.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Capability not available on this host: {0}")]
    NotAvailable(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
