use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayCountError {
    /// Count API login failed or credentials are missing
    #[error("Count service authentication failed: {0}")]
    Auth(String),

    /// Count API endpoint is not configured
    #[error("Count service not configured: {0}")]
    NotConfigured(String),

    /// Count API returned a non-success status
    #[error("Count service error (status {status}): {message}")]
    Backend { status: u16, message: String },

    /// Failed to parse a count API response
    #[error("Failed to parse count service response: {0}")]
    Parse(String),

    /// Transport-level failure
    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, PlayCountError>;
