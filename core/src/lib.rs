//! Retrieval core: content routing, planning, and multi-transport exchange
//! for pulling a content-addressed DAG out of the network.
//!
//! [`session::Session`] is the entry point. It wires a [`routing::Router`]
//! (who has this?), a [`planning::Scheduler`] (who should I ask, in what
//! order?), and an [`exchange::ExchangeMux`] (go get it) around a shared
//! [`store::BlockStore`], and resolves each `Get` only once the requested
//! selector is verifiably complete in the local store.

pub mod cid;
pub mod config;
pub mod error;
pub mod exchange;
pub mod link;
pub mod multicodec;
pub mod node;
pub mod planning;
pub mod routing;
pub mod selector;
pub mod session;
pub mod store;

pub use cid::Cid;
pub use config::{Datastore, MapDatastore, SessionOptions, SessionOptionsBuilder};
pub use error::GetError;
pub use exchange::{Exchange, ExchangeError, ExchangeMux, Libp2pDialer, Libp2pSession};
pub use link::Link;
pub use node::{Node, NodeError};
pub use planning::{Board, PlanError, Scheduler, TransportPlan, TransportRequest};
pub use routing::{HttpRouter, Provider, ProviderIdentity, RecordStream, Router, RoutingError};
pub use selector::Selector;
pub use session::Session;
pub use store::{BlockStore, CachingStore, LinkSystem, LinkSystemError, StoreError, WriteThroughStore};

#[cfg(feature = "paid-retrieval")]
pub use exchange::{ChannelEvent, DataTransferManager, PaidRetrievalExchange, PaymentApi, Voucher};
