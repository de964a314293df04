use thiserror::Error;

/// Per-attempt transport failures.
#[derive(Debug, Error, Clone)]
pub enum ExchangeError {
    #[error("transport io error: {0}")]
    Transport(String),
    #[error("provider metadata did not match this exchange's expected format")]
    BadProviderMetadata,
    #[error("integrity mismatch: bytes do not hash to the requested cid")]
    Integrity,
    #[error("no exchange registered for protocol code {0:#x}")]
    UnknownCodec(u64),
    #[error("exchange mux is drained and no longer accepts requests")]
    Drained,
}
