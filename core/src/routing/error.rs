use thiserror::Error;

/// Errors surfaced from content routing.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("indexer request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("malformed indexer response: {0}")]
    MalformedResponse(String),
    #[error("malformed provider metadata: {0}")]
    MalformedMetadata(String),
    #[error("indexer returned status {0}")]
    BadStatus(reqwest::StatusCode),
}
