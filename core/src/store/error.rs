use thiserror::Error;

/// Errors from the link-addressed store's public surface.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("integrity mismatch: bytes do not hash to the requested cid")]
    Integrity,
    #[error("store io error: {0}")]
    Io(String),
}
