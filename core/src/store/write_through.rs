use super::{BlockStore, StoreError};
use crate::cid::{self, Cid};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Wraps a shared [`BlockStore`] with a per-session overlay that is never
/// evicted for the life of the session.
///
/// Reads consult the overlay first, then the base; base hits are promoted
/// into the overlay. Writes go to both. Multiple exchanges within one
/// session may read and write the overlay concurrently, hence the
/// reader-writer lock rather than a plain `Mutex`.
pub struct WriteThroughStore<B: BlockStore> {
    base: Arc<B>,
    overlay: RwLock<HashMap<Cid, Bytes>>,
}

impl<B: BlockStore> WriteThroughStore<B> {
    pub fn new(base: Arc<B>) -> Self {
        WriteThroughStore {
            base,
            overlay: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<B: BlockStore> BlockStore for WriteThroughStore<B> {
    async fn has(&self, cid: &Cid) -> Result<bool, StoreError> {
        if self.overlay.read().await.contains_key(cid) {
            return Ok(true);
        }
        self.base.has(cid).await
    }

    async fn get(&self, cid: &Cid) -> Result<Bytes, StoreError> {
        if let Some(bytes) = self.overlay.read().await.get(cid).cloned() {
            return Ok(bytes);
        }
        let bytes = self.base.get(cid).await?;
        self.overlay.write().await.insert(*cid, bytes.clone());
        Ok(bytes)
    }

    async fn put(&self, cid: &Cid, bytes: Bytes) -> Result<(), StoreError> {
        if !cid::verify(cid, &bytes) {
            return Err(StoreError::Integrity);
        }
        self.overlay.write().await.insert(*cid, bytes.clone());
        self.base.put(cid, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CachingStore;
    use crate::multicodec::RAW;

    #[tokio::test]
    async fn overlay_hides_base_eviction() {
        let base = Arc::new(CachingStore::new(8));
        let wts = WriteThroughStore::new(base.clone());

        let bytes = Bytes::from_static(b"abcdefgh");
        let cid = cid::of(RAW, &bytes);
        wts.put(&cid, bytes.clone()).await.unwrap();

        // Evict it from the base by forcing another write past budget.
        let other = Bytes::from_static(b"xxxxxxxx");
        let other_cid = cid::of(RAW, &other);
        base.put(&other_cid, other).await.unwrap();
        assert!(!base.has(&cid).await.unwrap());

        // The overlay still has it.
        assert!(wts.has(&cid).await.unwrap());
        assert_eq!(wts.get(&cid).await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn base_hits_are_promoted_into_overlay() {
        let base = Arc::new(CachingStore::new(1024));
        let bytes = Bytes::from_static(b"promoted");
        let cid = cid::of(RAW, &bytes);
        base.put(&cid, bytes.clone()).await.unwrap();

        let wts = WriteThroughStore::new(base);
        assert_eq!(wts.get(&cid).await.unwrap(), bytes);
        assert!(wts.overlay.read().await.contains_key(&cid));
    }
}
