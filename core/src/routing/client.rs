use super::error::RoutingError;
use super::record::RoutingRecord;
use super::wire;
use crate::cid::{self, Cid};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub type RecordStream = Pin<Box<dyn Stream<Item = RoutingRecord> + Send>>;

/// Locates providers for content. An evolution of libp2p's own
/// `ContentRouting` interface, narrowed to the retrieval half.
pub trait Router: Send + Sync {
    fn find_providers(&self, ctx: CancellationToken, cid: Cid) -> RecordStream;
}

/// A router backed by a single delegated HTTP indexer endpoint (e.g.
/// storetheindex). The `reqwest::Client` is shared and connection-pooled
/// across every call.
pub struct HttpRouter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRouter {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpRouter {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        HttpRouter {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Router for HttpRouter {
    #[tracing::instrument(skip(self, ctx), fields(cid = %query))]
    fn find_providers(&self, ctx: CancellationToken, query: Cid) -> RecordStream {
        tracing::debug!("querying indexer for providers");
        let client = self.client.clone();
        let url = format!(
            "{}/multihash/{}",
            self.base_url.trim_end_matches('/'),
            cid::multihash_base58(&query)
        );

        Box::pin(async_stream::stream! {
            let fetch = async {
                client.get(&url).send().await
            };

            let response = tokio::select! {
                biased;
                _ = ctx.cancelled() => return,
                result = fetch => result,
            };

            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    yield RoutingRecord::Error {
                        request: query,
                        cause: Arc::new(RoutingError::Request(e)),
                    };
                    return;
                }
            };

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return;
            }
            if !response.status().is_success() {
                yield RoutingRecord::Error {
                    request: query,
                    cause: Arc::new(RoutingError::BadStatus(response.status())),
                };
                return;
            }

            let body = tokio::select! {
                biased;
                _ = ctx.cancelled() => return,
                body = response.bytes() => body,
            };

            let body = match body {
                Ok(body) => body,
                Err(e) => {
                    yield RoutingRecord::Error {
                        request: query,
                        cause: Arc::new(RoutingError::Request(e)),
                    };
                    return;
                }
            };

            match wire::decode_response(query, &body) {
                Ok(records) => {
                    for record in records {
                        if ctx.is_cancelled() {
                            return;
                        }
                        yield record;
                    }
                }
                Err(e) => {
                    yield RoutingRecord::Error {
                        request: query,
                        cause: Arc::new(e),
                    };
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multicodec::{RAW, TRANSPORT_HTTP};
    use futures::StreamExt;
    use libp2p::PeerId;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_body(query: &Cid, protocol: u64) -> String {
        use base64::Engine;
        let mh = base64::engine::general_purpose::STANDARD.encode(query.hash().to_bytes());
        let mut buf = unsigned_varint::encode::u64_buffer();
        let metadata =
            base64::engine::general_purpose::STANDARD.encode(unsigned_varint::encode::u64(protocol, &mut buf));
        let peer_id = PeerId::random().to_base58();
        format!(
            r#"{{"MultihashResults":[{{"Multihash":"{mh}","ProviderResults":[{{"Metadata":"{metadata}","Provider":{{"ID":"{peer_id}","Addrs":["/ip4/127.0.0.1/tcp/4001"]}}}}]}}]}}"#
        )
    }

    #[tokio::test]
    async fn yields_one_record_per_provider_result() {
        let server = MockServer::start().await;
        let query = cid::of(RAW, b"hello");
        Mock::given(method("GET"))
            .and(path(format!("/multihash/{}", cid::multihash_base58(&query))))
            .respond_with(ResponseTemplate::new(200).set_body_string(sample_body(&query, TRANSPORT_HTTP)))
            .mount(&server)
            .await;

        let router = HttpRouter::new(server.uri());
        let records: Vec<_> = router
            .find_providers(CancellationToken::new(), query)
            .collect()
            .await;
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn not_found_is_an_empty_stream() {
        let server = MockServer::start().await;
        let query = cid::of(RAW, b"hello");
        Mock::given(method("GET"))
            .and(path(format!("/multihash/{}", cid::multihash_base58(&query))))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let router = HttpRouter::new(server.uri());
        let records: Vec<_> = router
            .find_providers(CancellationToken::new(), query)
            .collect()
            .await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn server_error_yields_a_single_error_record() {
        let server = MockServer::start().await;
        let query = cid::of(RAW, b"hello");
        Mock::given(method("GET"))
            .and(path(format!("/multihash/{}", cid::multihash_base58(&query))))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let router = HttpRouter::new(server.uri());
        let records: Vec<_> = router
            .find_providers(CancellationToken::new(), query)
            .collect()
            .await;
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], RoutingRecord::Error { .. }));
    }
}
