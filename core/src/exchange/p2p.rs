use super::error::ExchangeError;
use super::interface::{EventData, EventStream, Exchange};
use crate::multicodec::TRANSPORT_BITSWAP;
use crate::node::Node;
use crate::planning::TransportRequest;
use crate::store::BlockStore;
use async_trait::async_trait;
use bytes::Bytes;
use libp2p::{Multiaddr, PeerId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// A block-fetch session over an already-dialed libp2p connection. Injected
/// so this crate doesn't have to construct or drive an actual `Swarm`;
/// a real implementation would wrap a bitswap or graphsync protocol handler.
#[async_trait]
pub trait Libp2pSession: Send + Sync {
    async fn fetch_block(&self, cid: &crate::cid::Cid) -> Result<Bytes, ExchangeError>;
}

/// Dials a peer and returns a session for it. Injected capability; the host
/// construction and transport negotiation live outside this crate.
#[async_trait]
pub trait Libp2pDialer: Send + Sync {
    async fn dial(
        &self,
        peer_id: PeerId,
        addrs: &[Multiaddr],
    ) -> Result<Arc<dyn Libp2pSession>, ExchangeError>;
}

/// Fetches blocks from a libp2p peer over whatever session the injected
/// [`Libp2pDialer`] hands back. Per-peer sessions are cached for the
/// life of the exchange.
pub struct Libp2pExchange<S: BlockStore> {
    dialer: Arc<dyn Libp2pDialer>,
    store: Arc<S>,
    sessions: Arc<Mutex<HashMap<PeerId, Arc<dyn Libp2pSession>>>>,
}

impl<S: BlockStore> Libp2pExchange<S> {
    pub fn new(dialer: Arc<dyn Libp2pDialer>, store: Arc<S>) -> Self {
        Libp2pExchange {
            dialer,
            store,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the cached session for `peer_id`, dialing and caching a new
    /// one if none exists yet.
    async fn session_for(
        dialer: &Arc<dyn Libp2pDialer>,
        sessions: &Mutex<HashMap<PeerId, Arc<dyn Libp2pSession>>>,
        peer_id: PeerId,
        addrs: &[Multiaddr],
    ) -> Result<Arc<dyn Libp2pSession>, ExchangeError> {
        if let Some(session) = sessions.lock().await.get(&peer_id) {
            return Ok(session.clone());
        }
        let session = dialer.dial(peer_id, addrs).await?;
        sessions.lock().await.insert(peer_id, session.clone());
        Ok(session)
    }

    /// Drops the cached session for every peer, closing the exchange's
    /// per-peer state.
    pub async fn close(&self) {
        self.sessions.lock().await.clear();
    }
}

impl<S: BlockStore + Send + Sync + 'static> Exchange for Libp2pExchange<S> {
    fn code(&self) -> u64 {
        TRANSPORT_BITSWAP
    }

    fn request_data(&self, ctx: CancellationToken, request: &TransportRequest) -> EventStream {
        tracing::debug!(peer = %request.provider.peer_id, root = %request.root, "starting libp2p fetch");
        let peer_id = request.provider.peer_id;
        let addrs = request.provider.addrs.clone();
        let store = self.store.clone();
        let root = request.root;
        let selector = request.selector;

        let dialer = self.dialer.clone();
        let sessions = self.sessions.clone();

        Box::pin(async_stream::stream! {
            yield EventData::start();

            let session = match Libp2pExchange::<S>::session_for(&dialer, &sessions, peer_id, &addrs).await {
                Ok(s) => s,
                Err(e) => {
                    yield EventData::failure(e);
                    return;
                }
            };

            let mut stack = vec![root];
            loop {
                if ctx.is_cancelled() {
                    yield EventData::failure(ExchangeError::Transport("cancelled".into()));
                    return;
                }
                let Some(link) = stack.pop() else { break };

                let bytes = match store.get(link.cid()).await {
                    Ok(bytes) => bytes,
                    Err(_) => {
                        let fetched = match session.fetch_block(link.cid()).await {
                            Ok(b) => b,
                            Err(e) => {
                                yield EventData::failure(e);
                                return;
                            }
                        };
                        if !crate::cid::verify(link.cid(), &fetched) {
                            yield EventData::failure(ExchangeError::Integrity);
                            return;
                        }
                        if store.put(link.cid(), fetched.clone()).await.is_err() {
                            yield EventData::failure(ExchangeError::Integrity);
                            return;
                        }
                        fetched
                    }
                };

                let node = match Node::decode(link.cid().codec(), bytes) {
                    Ok(node) => node,
                    Err(_) => {
                        yield EventData::failure(ExchangeError::Transport("undecodable node".into()));
                        return;
                    }
                };
                yield EventData::progress(link);
                stack.extend(selector.links_to_follow(&node));
            }

            yield EventData::success();
        })
    }
}
