use super::{BlockStore, StoreError};
use crate::cid::{self, Cid};
use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

struct Inner {
    cache: LruCache<Cid, Bytes>,
    used_bytes: usize,
}

/// A bounded, shared cache of blocks, keyed by CID, with a byte budget.
///
/// Eviction is recency-ordered: the least-recently-used entry is dropped
/// first once a `put` would push `used_bytes` over `budget_bytes`. A single
/// value larger than the whole budget is rejected rather than accepted and
/// immediately evicted.
pub struct CachingStore {
    inner: Mutex<Inner>,
    budget_bytes: usize,
}

impl CachingStore {
    pub fn new(budget_bytes: usize) -> Self {
        CachingStore {
            // The entry-count cap is set generously high; `used_bytes`
            // against `budget_bytes` is the real eviction trigger.
            inner: Mutex::new(Inner {
                cache: LruCache::new(NonZeroUsize::new(1 << 20).unwrap()),
                used_bytes: 0,
            }),
            budget_bytes,
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.inner.lock().used_bytes
    }
}

#[async_trait]
impl BlockStore for CachingStore {
    async fn has(&self, cid: &Cid) -> Result<bool, StoreError> {
        Ok(self.inner.lock().cache.contains(cid))
    }

    async fn get(&self, cid: &Cid) -> Result<Bytes, StoreError> {
        let bytes = {
            let mut inner = self.inner.lock();
            inner.cache.get(cid).cloned()
        };
        match bytes {
            None => Err(StoreError::NotFound),
            Some(bytes) if cid::verify(cid, &bytes) => Ok(bytes),
            Some(_) => Err(StoreError::Integrity),
        }
    }

    async fn put(&self, cid: &Cid, bytes: Bytes) -> Result<(), StoreError> {
        if !cid::verify(cid, &bytes) {
            return Err(StoreError::Integrity);
        }
        let cost = bytes.len();
        if cost > self.budget_bytes {
            // Best-effort: too large to ever fit, silently not cached.
            return Ok(());
        }

        let mut inner = self.inner.lock();
        while inner.used_bytes + cost > self.budget_bytes {
            match inner.cache.pop_lru() {
                Some((_, evicted)) => inner.used_bytes -= evicted.len(),
                None => break,
            }
        }
        if let Some(replaced) = inner.cache.put(*cid, bytes) {
            inner.used_bytes -= replaced.len();
        }
        inner.used_bytes += cost;
        Ok(())
    }
}
