use crate::cid::Cid;
use bytes::Bytes;
use libp2p::{Multiaddr, PeerId};
use std::borrow::Cow;
use std::sync::Arc;

/// Compares provider identities by canonical string form rather than
/// structural equality, per the board's `providers_equal` contract.
pub trait ProviderIdentity: Send + Sync {
    fn canonical_id(&self) -> Cow<'_, str>;
}

/// A provider advertised by the indexer: a libp2p peer identity plus the
/// multiaddrs it can be dialed on. The peer ID is the canonical identity
/// regardless of which transport protocol this particular record advertises.
#[derive(Debug, Clone)]
pub struct Provider {
    pub peer_id: PeerId,
    pub addrs: Vec<Multiaddr>,
}

impl ProviderIdentity for Provider {
    fn canonical_id(&self) -> Cow<'_, str> {
        Cow::Owned(self.peer_id.to_base58())
    }
}

/// A tagged routing response. Errors and provider advertisements share
/// a stream; the router emits one `Provider` record per advertised protocol
/// rather than grouping protocols under a single record.
#[derive(Debug, Clone)]
pub enum RoutingRecord {
    Error {
        request: Cid,
        cause: Arc<super::RoutingError>,
    },
    Provider {
        request: Cid,
        protocol: u64,
        provider: Provider,
        metadata: Bytes,
    },
}

impl RoutingRecord {
    pub fn request(&self) -> Cid {
        match self {
            RoutingRecord::Error { request, .. } => *request,
            RoutingRecord::Provider { request, .. } => *request,
        }
    }
}
