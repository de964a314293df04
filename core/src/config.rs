//! Session construction options.
//!
//! Mirrors the reference's functional-options pattern: each `with_*` call
//! mutates a private config struct, and `SessionOptions::apply_defaults`
//! fills in anything left unset.

use crate::exchange::Libp2pDialer;
#[cfg(feature = "paid-retrieval")]
use crate::exchange::{DataTransferManager, PaymentApi};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CACHE_BYTES: usize = 64 * 1024 * 1024;
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_INDEXER: &str = "https://cid.contact";

/// A minimal batching key/value store, mirroring go-datastore's `Batching`
/// interface narrowly enough to back a channel registry. Not consumed
/// internally by this crate's exchanges (each injected capability owns its
/// own persistence); exposed here only because `Session::new` callers often
/// want to hand the same store to whatever constructs their
/// `DataTransferManager`.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<u8>>;
    async fn put(&self, key: &str, value: Vec<u8>);
    async fn has(&self, key: &str) -> bool;
}

/// An in-memory `Datastore`, used as the zero-config default.
#[derive(Default)]
pub struct MapDatastore {
    inner: tokio::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl Datastore for MapDatastore {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.lock().await.get(key).cloned()
    }

    async fn put(&self, key: &str, value: Vec<u8>) {
        self.inner.lock().await.insert(key.to_string(), value);
    }

    async fn has(&self, key: &str) -> bool {
        self.inner.lock().await.contains_key(key)
    }
}

pub struct SessionOptions {
    pub(crate) indexer_url: String,
    pub(crate) cache_bytes: usize,
    pub(crate) tick_interval: Duration,
    pub(crate) datastore: Arc<dyn Datastore>,
    pub(crate) libp2p_dialer: Option<Arc<dyn Libp2pDialer>>,
    #[cfg(feature = "paid-retrieval")]
    pub(crate) data_transfer: Option<Arc<dyn DataTransferManager>>,
    #[cfg(feature = "paid-retrieval")]
    pub(crate) payment: Option<Arc<dyn PaymentApi>>,
}

impl SessionOptions {
    pub fn builder() -> SessionOptionsBuilder {
        SessionOptionsBuilder::default()
    }
}

/// Accumulates `with_*` calls; `build()` applies defaults for anything left
/// unset, matching the reference's `applyDefaults`.
#[derive(Default)]
pub struct SessionOptionsBuilder {
    indexer_url: Option<String>,
    cache_bytes: Option<usize>,
    tick_interval: Option<Duration>,
    datastore: Option<Arc<dyn Datastore>>,
    libp2p_dialer: Option<Arc<dyn Libp2pDialer>>,
    #[cfg(feature = "paid-retrieval")]
    data_transfer: Option<Arc<dyn DataTransferManager>>,
    #[cfg(feature = "paid-retrieval")]
    payment: Option<Arc<dyn PaymentApi>>,
}

impl SessionOptionsBuilder {
    pub fn with_indexer(mut self, url: impl Into<String>) -> Self {
        self.indexer_url = Some(url.into());
        self
    }

    pub fn with_cache_bytes(mut self, bytes: usize) -> Self {
        self.cache_bytes = Some(bytes);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = Some(interval);
        self
    }

    pub fn with_datastore(mut self, datastore: Arc<dyn Datastore>) -> Self {
        self.datastore = Some(datastore);
        self
    }

    pub fn with_host(mut self, dialer: Arc<dyn Libp2pDialer>) -> Self {
        self.libp2p_dialer = Some(dialer);
        self
    }

    #[cfg(feature = "paid-retrieval")]
    pub fn with_data_transfer(mut self, manager: Arc<dyn DataTransferManager>) -> Self {
        self.data_transfer = Some(manager);
        self
    }

    #[cfg(feature = "paid-retrieval")]
    pub fn with_payment_api(mut self, payment: Arc<dyn PaymentApi>) -> Self {
        self.payment = Some(payment);
        self
    }

    pub fn build(self) -> SessionOptions {
        SessionOptions {
            indexer_url: self.indexer_url.unwrap_or_else(|| DEFAULT_INDEXER.to_string()),
            cache_bytes: self.cache_bytes.unwrap_or(DEFAULT_CACHE_BYTES),
            tick_interval: self.tick_interval.unwrap_or(DEFAULT_TICK_INTERVAL),
            datastore: self.datastore.unwrap_or_else(|| Arc::new(MapDatastore::default())),
            libp2p_dialer: self.libp2p_dialer,
            #[cfg(feature = "paid-retrieval")]
            data_transfer: self.data_transfer,
            #[cfg(feature = "paid-retrieval")]
            payment: self.payment,
        }
    }
}
