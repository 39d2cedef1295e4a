//! Error types for the object-storage provider

use thiserror::Error;

/// Object-storage provider errors
///
/// `MissingCredential` is raised before any network call; `Bridge` wraps
/// transport failures; `Backend` carries the non-2xx status surfaced by the
/// storage service. Existence checks degrade all of these to "not found"
/// instead of propagating.
#[derive(Error, Debug)]
pub enum OssError {
    /// Credential field required for signing is absent
    #[error("Storage credential incomplete: missing {0}")]
    MissingCredential(&'static str),

    /// No endpoint and no bucket/region to derive a URL from
    #[error("Object storage not configured: {0}")]
    NotConfigured(String),

    /// Backend responded with a non-success status
    #[error("Storage backend error (status {status}): {message}")]
    Backend { status: u16, message: String },

    /// Upload payload was empty; never stored
    #[error("Refusing to upload empty payload for {0}")]
    EmptyObject(String),

    /// Transport-level failure
    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, OssError>;

impl From<OssError> for bridge_traits::error::BridgeError {
    fn from(error: OssError) -> Self {
        match error {
            OssError::Bridge(e) => e,
            other => bridge_traits::error::BridgeError::OperationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = OssError::Backend {
            status: 404,
            message: "NoSuchKey".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Storage backend error (status 404): NoSuchKey"
        );
    }

    #[test]
    fn test_error_conversion() {
        let error = OssError::MissingCredential("secret_key");
        let bridge_error: bridge_traits::error::BridgeError = error.into();

        assert!(matches!(
            bridge_error,
            bridge_traits::error::BridgeError::OperationFailed(_)
        ));
    }
}
