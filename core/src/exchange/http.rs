use super::error::ExchangeError;
use super::interface::{EventData, EventStream, Exchange};
use crate::link::Link;
use crate::multicodec::TRANSPORT_HTTP;
use crate::node::Node;
use crate::planning::TransportRequest;
use crate::routing::ProviderIdentity;
use crate::store::BlockStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fetches blocks over plain HTTP: `GET {base}/{cid}` per block, one request
/// at a time, no range support. The provider's multiaddrs are probed
/// for an `/http` or `/https` component; the first that resolves to a URL
/// wins.
pub struct HttpExchange<S: BlockStore> {
    client: reqwest::Client,
    store: Arc<S>,
}

impl<S: BlockStore> HttpExchange<S> {
    pub fn new(store: Arc<S>) -> Self {
        HttpExchange { client: reqwest::Client::new(), store }
    }

    pub fn with_client(client: reqwest::Client, store: Arc<S>) -> Self {
        HttpExchange { client, store }
    }
}

fn base_url(addrs: &[libp2p::Multiaddr]) -> Option<String> {
    for addr in addrs {
        let mut host = None;
        let mut port = None;
        let mut scheme = "http";
        for component in addr.iter() {
            match component {
                libp2p::multiaddr::Protocol::Ip4(ip) => host = Some(ip.to_string()),
                libp2p::multiaddr::Protocol::Ip6(ip) => host = Some(ip.to_string()),
                libp2p::multiaddr::Protocol::Dns(d)
                | libp2p::multiaddr::Protocol::Dns4(d)
                | libp2p::multiaddr::Protocol::Dns6(d) => host = Some(d.to_string()),
                libp2p::multiaddr::Protocol::Tcp(p) => port = Some(p),
                libp2p::multiaddr::Protocol::Https => scheme = "https",
                libp2p::multiaddr::Protocol::Http => scheme = "http",
                _ => {}
            }
        }
        if let (Some(host), Some(port)) = (host, port) {
            return Some(format!("{scheme}://{host}:{port}"));
        }
    }
    None
}

impl<S: BlockStore + Send + Sync + 'static> Exchange for HttpExchange<S> {
    fn code(&self) -> u64 {
        TRANSPORT_HTTP
    }

    fn request_data(&self, ctx: CancellationToken, request: &TransportRequest) -> EventStream {
        tracing::debug!(
            provider = %request.provider.canonical_id(),
            root = %request.root,
            "starting http fetch"
        );
        let Some(base) = base_url(&request.provider.addrs) else {
            return Box::pin(futures::stream::once(async {
                EventData::failure(ExchangeError::BadProviderMetadata)
            }));
        };

        let client = self.client.clone();
        let store = self.store.clone();
        let root = request.root;
        let selector = request.selector;

        Box::pin(async_stream::stream! {
            yield EventData::start();

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
                        let url = format!("{base}/{}", link.cid());
                        let response = tokio::select! {
                            biased;
                            _ = ctx.cancelled() => {
                                yield EventData::failure(ExchangeError::Transport("cancelled".into()));
                                return;
                            }
                            result = client.get(&url).send() => result,
                        };
                        let response = match response {
                            Ok(r) => r,
                            Err(e) => {
                                yield EventData::failure(ExchangeError::Transport(e.to_string()));
                                return;
                            }
                        };
                        if !response.status().is_success() {
                            yield EventData::failure(ExchangeError::Transport(format!(
                                "status {}", response.status()
                            )));
                            return;
                        }
                        let body = match response.bytes().await {
                            Ok(b) => b,
                            Err(e) => {
                                yield EventData::failure(ExchangeError::Transport(e.to_string()));
                                return;
                            }
                        };
                        if !crate::cid::verify(link.cid(), &body) {
                            yield EventData::failure(ExchangeError::Integrity);
                            return;
                        }
                        if store.put(link.cid(), body.clone()).await.is_err() {
                            yield EventData::failure(ExchangeError::Integrity);
                            return;
                        }
                        body
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
