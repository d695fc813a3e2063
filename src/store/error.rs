use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the flat-file document stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key is not usable as a file name
    #[error("Invalid document key: {0:?}")]
    InvalidKey(String),

    /// A patch would leave the document in an invalid shape
    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    /// File exists but does not parse
    #[error("Document {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub(crate) fn io_error(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.into();
    move |source| StoreError::Io { path, source }
}
