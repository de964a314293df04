use crate::link::Link;
use crate::routing::{Provider, ProviderIdentity};
use crate::selector::Selector;
use bytes::Bytes;
use std::sync::Arc;
use uuid::Uuid;

/// An immutable, uniquely-identified attempt to fetch `root` under `selector`
/// from `provider` over `protocol`. Constructed from a Provider routing
/// record plus the in-flight Get's root and selector.
#[derive(Clone)]
pub struct TransportRequest {
    id: Uuid,
    pub protocol: u64,
    pub root: Link,
    pub selector: Selector,
    pub provider: Arc<Provider>,
    pub metadata: Bytes,
}

impl TransportRequest {
    pub fn new(
        protocol: u64,
        root: Link,
        selector: Selector,
        provider: Arc<Provider>,
        metadata: Bytes,
    ) -> Self {
        TransportRequest {
            id: Uuid::new_v4(),
            protocol,
            root,
            selector,
            provider,
            metadata,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl std::fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportRequest")
            .field("id", &self.id)
            .field("protocol", &self.protocol)
            .field("root", &self.root)
            .field("provider", &self.provider.canonical_id())
            .finish()
    }
}

/// What the scheduler hands the session on each tick: either the single best
/// candidate to attempt, or a terminal planning error.
#[derive(Debug)]
pub enum TransportPlan {
    /// Kept as a vector for forward compatibility with planners that batch
    /// multiple simultaneous attempts; the shipped scheduler only ever
    /// populates zero or one entries.
    Requests(Vec<TransportRequest>),
    Error(PlanError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("no transport available for this content")]
    NoTransport,
}
