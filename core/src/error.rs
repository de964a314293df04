use crate::exchange::ExchangeError;
use crate::node::NodeError;
use crate::planning::PlanError;
use crate::routing::RoutingError;
use crate::store::{LinkSystemError, StoreError};
use thiserror::Error;

/// The top-level error kind surfaced to `Session::get` callers. Each
/// per-module error converts into one of these; most per-attempt failures
/// never reach here at all — they're absorbed into board scoring and only
/// surface if every attempt is exhausted.
#[derive(Debug, Error)]
pub enum GetError {
    #[error("no provider for this content was found")]
    NotFound,
    #[error("planning exhausted every candidate without success")]
    NoTransport,
    #[error("a provider delivered bytes that did not match the requested cid")]
    Integrity,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("no exchange registered for protocol code {0:#x}")]
    UnknownCodec(u64),
    #[error("operation cancelled")]
    Cancelled,
    #[error("indexer protocol error: {0}")]
    IndexerProtocol(#[from] RoutingError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Node(#[from] NodeError),
}

impl From<LinkSystemError> for GetError {
    fn from(e: LinkSystemError) -> Self {
        match e {
            LinkSystemError::Store(e) => GetError::Store(e),
            LinkSystemError::Node(e) => GetError::Node(e),
        }
    }
}

impl From<PlanError> for GetError {
    fn from(_: PlanError) -> Self {
        GetError::NoTransport
    }
}

impl From<ExchangeError> for GetError {
    fn from(e: ExchangeError) -> Self {
        match e {
            ExchangeError::Integrity => GetError::Integrity,
            ExchangeError::UnknownCodec(code) => GetError::UnknownCodec(code),
            ExchangeError::Transport(msg) => GetError::Transport(msg),
            ExchangeError::BadProviderMetadata => {
                GetError::Transport("provider metadata did not match this exchange".into())
            }
        }
    }
}
