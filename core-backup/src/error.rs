use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    /// Malformed backup document; fatal for the affected merge call only
    #[error("Malformed backup document: {0}")]
    Format(String),

    /// Storage transfer failed
    #[error("Storage error: {0}")]
    Storage(#[from] provider_oss::OssError),

    /// Settings store failed
    #[error("Settings error: {0}")]
    Settings(#[from] bridge_traits::error::BridgeError),

    /// Collaborator (collection store / extension manager) failed
    #[error(transparent)]
    Library(#[from] core_library::error::LibraryError),
}

pub type Result<T> = std::result::Result<T, BackupError>;
