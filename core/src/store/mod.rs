//! Link-addressed storage.
//!
//! [`BlockStore`] is the public contract: `has`/`get`/`put` keyed by [`Cid`],
//! with `get` and `put` verifying bytes against the key's multihash so a
//! caller can never observe corrupted content silently. [`CachingStore`] is
//! the bounded, evictable layer; [`WriteThroughStore`] adds the per-session
//! overlay that keeps in-flight writes pinned; [`LinkSystem`] sits on top of
//! either and adds codec decode/encode to move between bytes and [`Node`].

mod caching;
mod error;
mod link_system;
mod write_through;

pub use caching::CachingStore;
pub use error::StoreError;
pub use link_system::{LinkSystem, LinkSystemError};
pub use write_through::WriteThroughStore;

use crate::cid::Cid;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn has(&self, cid: &Cid) -> Result<bool, StoreError>;
    async fn get(&self, cid: &Cid) -> Result<Bytes, StoreError>;
    async fn put(&self, cid: &Cid, bytes: Bytes) -> Result<(), StoreError>;
}
