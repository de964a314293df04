//! Multi-transport data fetching: one [`Exchange`] per protocol code, fanned
//! into a single event stream by [`ExchangeMux`].

mod error;
mod http;
mod interface;
mod mux;
mod p2p;

#[cfg(feature = "paid-retrieval")]
mod paid;

pub use error::ExchangeError;
pub use http::HttpExchange;
pub use interface::{EventData, EventKind, EventStream, Exchange, MuxEvent};
pub use mux::{ExchangeMux, MuxEventStream};
pub use p2p::{Libp2pDialer, Libp2pExchange, Libp2pSession};

#[cfg(feature = "paid-retrieval")]
pub use paid::{ChannelEvent, DataTransferManager, PaidRetrievalExchange, PaidRetrievalMetadata, PaymentApi, Voucher};
