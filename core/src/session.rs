use crate::cid::Cid;
use crate::config::SessionOptions;
use crate::error::GetError;
use crate::exchange::{Exchange, ExchangeMux, HttpExchange, Libp2pDialer, Libp2pExchange};
#[cfg(feature = "paid-retrieval")]
use crate::exchange::{DataTransferManager, PaidRetrievalExchange, PaymentApi};
use crate::link::Link;
use crate::node::Node;
use crate::planning::{Scheduler, TransportPlan};
use crate::routing::{HttpRouter, Router};
use crate::selector::Selector;
use crate::store::{BlockStore, CachingStore, LinkSystem, WriteThroughStore};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Owns a router handle and the shared base store for its lifetime; every
/// `Get` gets its own scheduler, board, write-through overlay, and exchange
/// mux so concurrent `Get` calls never share mutable state beyond
/// the base cache and router.
pub struct Session<S: BlockStore> {
    base_store: Arc<S>,
    router: Arc<dyn Router>,
    libp2p_dialer: Option<Arc<dyn Libp2pDialer>>,
    #[cfg(feature = "paid-retrieval")]
    paid: Option<(Arc<dyn DataTransferManager>, Arc<dyn PaymentApi>)>,
    tick_interval: Duration,
}

impl Session<CachingStore> {
    /// Builds a session backed by the default `CachingStore` and an
    /// HTTP-delegated indexer router, per the supplied options.
    pub fn new(options: SessionOptions) -> Result<Self, GetError> {
        let base_store = Arc::new(CachingStore::new(options.cache_bytes));
        let router: Arc<dyn Router> = Arc::new(HttpRouter::new(options.indexer_url));

        #[cfg(feature = "paid-retrieval")]
        let paid = match (options.data_transfer, options.payment) {
            (Some(dt), Some(pay)) => Some((dt, pay)),
            _ => None,
        };

        Ok(Session {
            base_store,
            router,
            libp2p_dialer: options.libp2p_dialer,
            #[cfg(feature = "paid-retrieval")]
            paid,
            tick_interval: options.tick_interval,
        })
    }
}

impl<S: BlockStore + Send + Sync + 'static> Session<S> {
    /// Fetches `root` (and whatever `selector` reaches) into the store and
    /// returns the decoded root node.
    ///
    /// Success is determined by re-walking `selector` against the verified
    /// local store once any attempt reports `Success` — not by trusting that
    /// event alone, since an exchange's own success signal only reports what
    /// the transport did, not what actually landed in the store.
    #[tracing::instrument(skip(self, ctx), fields(root = %root))]
    pub async fn get(
        &self,
        ctx: CancellationToken,
        root: Cid,
        selector: Selector,
    ) -> Result<Node, GetError> {
        let gctx = ctx.child_token();
        let _drop_guard = gctx.clone().drop_guard();

        let overlay = Arc::new(WriteThroughStore::new(self.base_store.clone()));
        let link_system = LinkSystem::new(overlay.clone());

        let records = self.router.find_providers(gctx.clone(), root);
        let scheduler = Arc::new(Scheduler::with_tick_interval(self.tick_interval));
        let mut plans = scheduler.schedule(gctx.clone(), root, selector, records);

        let mux = ExchangeMux::new();
        mux.register(Arc::new(HttpExchange::new(overlay.clone())) as Arc<dyn Exchange>);
        if let Some(dialer) = &self.libp2p_dialer {
            mux.register(Arc::new(Libp2pExchange::new(dialer.clone(), overlay.clone())) as Arc<dyn Exchange>);
        }
        #[cfg(feature = "paid-retrieval")]
        if let Some((dt, pay)) = &self.paid {
            mux.register(Arc::new(PaidRetrievalExchange::new(dt.clone(), pay.clone())) as Arc<dyn Exchange>);
        }

        let mut events = mux.subscribe();

        // `mux.add` is only ever called from within this loop, so dropping
        // the mux's held sender (via `mark_drained`) right after the loop
        // exits - on every exit path - is what lets the unified channel
        // close once the forwarders already spawned finish, without risking
        // a premature close while a later plan might still add another one.
        let result = loop {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    break Err(GetError::Cancelled);
                }
                plan = plans.next() => {
                    match plan {
                        None => break Err(GetError::NoTransport),
                        Some(TransportPlan::Error(e)) => break Err(e.into()),
                        Some(TransportPlan::Requests(requests)) => {
                            for request in requests {
                                let id = request.id();
                                scheduler.begin(id);
                                if let Err(e) = mux.add(gctx.clone(), request) {
                                    tracing::warn!(error = %e, "could not honor transport request");
                                    scheduler.reconcile(id, false);
                                }
                            }
                        }
                    }
                }
                event = events.next() => {
                    match event {
                        None => {
                            break self.finish(&link_system, root, selector).await;
                        }
                        Some(mux_event) => {
                            use crate::exchange::EventKind;
                            match mux_event.data.kind {
                                EventKind::Error(cause) => {
                                    tracing::warn!(error = %cause, "transient error from exchange");
                                }
                                EventKind::Failure(cause) => {
                                    tracing::warn!(error = %cause, "transport request failed");
                                    scheduler.reconcile(mux_event.source.id(), false);
                                }
                                EventKind::Success => {
                                    scheduler.reconcile(mux_event.source.id(), true);
                                    if link_system.is_complete(&root, selector).await {
                                        tracing::info!("selector satisfied, get complete");
                                        break link_system
                                            .load(&Link::new(root))
                                            .await
                                            .map_err(GetError::from);
                                    }
                                }
                                EventKind::Start | EventKind::Progress { .. } => {}
                            }
                        }
                    }
                }
            }
        };

        mux.mark_drained();
        result
    }

    async fn finish(
        &self,
        link_system: &LinkSystem<WriteThroughStore<S>>,
        root: Cid,
        selector: Selector,
    ) -> Result<Node, GetError> {
        if link_system.is_complete(&root, selector).await {
            Ok(link_system.load(&Link::new(root)).await?)
        } else {
            Err(GetError::NotFound)
        }
    }

    /// No persisted state to release; present for API symmetry with the
    /// reference's lifecycle.
    pub async fn close(&self) -> Result<(), GetError> {
        Ok(())
    }
}
