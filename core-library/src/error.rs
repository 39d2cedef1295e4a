use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Collection store error: {0}")]
    Store(String),

    #[error("Extension install failed for {url}: {message}")]
    Install { url: String, message: String },

    #[error("Extension manager error: {0}")]
    Extension(String),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
