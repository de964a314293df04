use super::error::ExchangeError;
use super::interface::{EventData, Exchange, MuxEvent};
use crate::planning::TransportRequest;
use futures::{FutureExt, Stream, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

pub type MuxEventStream = Pin<Box<dyn Stream<Item = MuxEvent> + Send>>;

const MUX_CHANNEL_BOUND: usize = 1;

/// Maps protocol codes to registered [`Exchange`]s and fans their event
/// streams into one unified channel.
///
/// An extra sender is held for as long as the mux might still be asked to
/// `add` a request — the live forwarder count transiently returning to zero
/// between two `add` calls does not mean no more are coming. The caller
/// signals that it is truly done by calling [`ExchangeMux::mark_drained`],
/// which drops the held sender; the channel then closes once every spawned
/// forwarder's own sender clone has also been dropped.
pub struct ExchangeMux {
    exchanges: RwLock<HashMap<u64, Arc<dyn Exchange>>>,
    held: Mutex<Option<mpsc::Sender<MuxEvent>>>,
    rx: Mutex<Option<mpsc::Receiver<MuxEvent>>>,
}

impl ExchangeMux {
    pub fn new() -> Arc<Self> {
        let (tx, rx) = mpsc::channel(MUX_CHANNEL_BOUND);
        Arc::new(ExchangeMux {
            exchanges: RwLock::new(HashMap::new()),
            held: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
        })
    }

    /// Inserts `exchange` under its advertised code. Duplicate codes
    /// overwrite; expected to be called before any `add`.
    pub fn register(&self, exchange: Arc<dyn Exchange>) {
        self.exchanges.write().insert(exchange.code(), exchange);
    }

    /// Resolves `request.protocol` to a registered exchange, invokes
    /// `request_data`, and spawns a forwarder that tags each event with
    /// `request` and pushes it onto the unified channel.
    pub fn add(
        self: &Arc<Self>,
        ctx: CancellationToken,
        request: TransportRequest,
    ) -> Result<(), ExchangeError> {
        let exchange = self
            .exchanges
            .read()
            .get(&request.protocol)
            .cloned()
            .ok_or(ExchangeError::UnknownCodec(request.protocol))?;

        let tx = self.held.lock().clone().ok_or(ExchangeError::Drained)?;

        let mut events = exchange.request_data(ctx, &request);
        tokio::spawn(async move {
            let source = request.clone();
            let panic_tx = tx.clone();

            let drained = AssertUnwindSafe(async {
                while let Some(event) = events.next().await {
                    if tx
                        .send(MuxEvent { source: request.clone(), data: event })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            })
            .catch_unwind()
            .await;

            // A panicking exchange must not wedge the mux's event stream; it
            // is reported as a normal Failure event instead.
            if drained.is_err() {
                let _ = panic_tx
                    .send(MuxEvent {
                        source,
                        data: EventData::failure(ExchangeError::Transport(
                            "exchange panicked while fetching".into(),
                        )),
                    })
                    .await;
            }
            drop(panic_tx);
        });

        Ok(())
    }

    /// Marks the mux as done accepting new `add` calls by dropping the held
    /// sender. The unified channel then closes once every forwarder spawned
    /// so far has also finished draining its own sender clone. Idempotent.
    pub fn mark_drained(&self) {
        self.held.lock().take();
    }

    /// Returns the unified channel. Closes once every forwarder has
    /// terminated and the mux is marked drained. May only be called once.
    pub fn subscribe(&self) -> MuxEventStream {
        let rx = self
            .rx
            .lock()
            .take()
            .expect("ExchangeMux::subscribe called more than once");
        Box::pin(ReceiverStream::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cid;
    use crate::exchange::interface::{EventData, EventStream};
    use crate::link::Link;
    use crate::multicodec::{RAW, TRANSPORT_HTTP};
    use crate::routing::Provider;
    use crate::selector::Selector;
    use bytes::Bytes;
    use libp2p::PeerId;

    struct StubExchange {
        code: u64,
        events: Vec<&'static str>,
    }

    impl Exchange for StubExchange {
        fn code(&self) -> u64 {
            self.code
        }

        fn request_data(&self, _ctx: CancellationToken, _request: &TransportRequest) -> EventStream {
            let events = self.events.clone();
            Box::pin(async_stream::stream! {
                for kind in events {
                    match kind {
                        "start" => yield EventData::start(),
                        "success" => yield EventData::success(),
                        _ => unreachable!(),
                    }
                }
            })
        }
    }

    fn request(protocol: u64) -> TransportRequest {
        let root = Link::new(cid::of(RAW, b"root"));
        let provider = Arc::new(Provider { peer_id: PeerId::random(), addrs: vec![] });
        TransportRequest::new(protocol, root, Selector::MatchRoot, provider, Bytes::new())
    }

    #[tokio::test]
    async fn unknown_codec_is_rejected_before_spawning_anything() {
        let mux = ExchangeMux::new();
        let err = mux.add(CancellationToken::new(), request(0xDEAD)).unwrap_err();
        assert!(matches!(err, ExchangeError::UnknownCodec(0xDEAD)));
    }

    #[tokio::test]
    async fn events_are_tagged_with_their_source_request() {
        let mux = ExchangeMux::new();
        mux.register(Arc::new(StubExchange { code: TRANSPORT_HTTP, events: vec!["start", "success"] }));

        let request = request(TRANSPORT_HTTP);
        let request_id = request.id();
        mux.add(CancellationToken::new(), request).unwrap();
        mux.mark_drained();

        let mut events = mux.subscribe();
        let first = events.next().await.unwrap();
        assert_eq!(first.source.id(), request_id);
        let second = events.next().await.unwrap();
        assert_eq!(second.source.id(), request_id);

        assert!(
            events.next().await.is_none(),
            "channel closes once drained and every forwarder has finished"
        );
    }

    #[tokio::test]
    async fn a_second_add_after_the_first_forwarder_drains_still_works() {
        // Regresses a bug where the held sender was dropped as soon as no
        // forwarder was live, wedging any `add` issued afterward.
        let mux = ExchangeMux::new();
        mux.register(Arc::new(StubExchange { code: TRANSPORT_HTTP, events: vec!["start"] }));

        let mut events = mux.subscribe();

        let first = request(TRANSPORT_HTTP);
        mux.add(CancellationToken::new(), first).unwrap();
        events.next().await.unwrap();

        // By now the first forwarder has produced its only event and its
        // task is finishing in the background, with no forwarder left live,
        // before this second `add` runs.
        let second = request(TRANSPORT_HTTP);
        let second_id = second.id();
        mux.add(CancellationToken::new(), second).unwrap();
        mux.mark_drained();

        let event = events.next().await.unwrap();
        assert_eq!(event.source.id(), second_id);
    }

    #[tokio::test]
    async fn add_after_mark_drained_is_rejected_as_drained_not_unknown_codec() {
        let mux = ExchangeMux::new();
        mux.register(Arc::new(StubExchange { code: TRANSPORT_HTTP, events: vec![] }));
        mux.mark_drained();

        let err = mux.add(CancellationToken::new(), request(TRANSPORT_HTTP)).unwrap_err();
        assert!(matches!(err, ExchangeError::Drained));
    }
}
