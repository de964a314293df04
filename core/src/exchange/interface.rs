use super::error::ExchangeError;
use crate::link::Link;
use crate::planning::TransportRequest;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A progress event from an exchange. `Start` always precedes every
/// other kind; at most one of `Success`/`Failure` ends the stream; `Error`
/// denotes a recoverable transient and never closes the stream.
#[derive(Debug, Clone)]
pub enum EventKind {
    Start,
    Progress { last_block: Link },
    Error(Arc<ExchangeError>),
    Success,
    Failure(Arc<ExchangeError>),
}

#[derive(Debug, Clone)]
pub struct EventData {
    pub kind: EventKind,
}

impl EventData {
    pub fn start() -> Self {
        EventData { kind: EventKind::Start }
    }
    pub fn progress(last_block: Link) -> Self {
        EventData { kind: EventKind::Progress { last_block } }
    }
    pub fn error(e: ExchangeError) -> Self {
        EventData { kind: EventKind::Error(Arc::new(e)) }
    }
    pub fn success() -> Self {
        EventData { kind: EventKind::Success }
    }
    pub fn failure(e: ExchangeError) -> Self {
        EventData { kind: EventKind::Failure(Arc::new(e)) }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::Success | EventKind::Failure(_))
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = EventData> + Send>>;

/// A transport capable of fetching a DAG from a specific kind of provider
///. Each concrete exchange advertises the protocol `code` it serves
/// under a multicodec-style identifier.
pub trait Exchange: Send + Sync {
    fn code(&self) -> u64;

    fn request_data(
        &self,
        ctx: CancellationToken,
        request: &TransportRequest,
    ) -> EventStream;
}

/// An [`EventData`] tagged with the [`TransportRequest`] that produced it, so
/// the session can reconcile board state against the right attempt.
#[derive(Debug, Clone)]
pub struct MuxEvent {
    pub source: TransportRequest,
    pub data: EventData,
}
