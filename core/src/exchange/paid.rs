//! Paid/streamed retrieval, feature-gated behind `paid-retrieval`.
//!
//! The only exchange whose `request_data` may block on external
//! asynchronous side effects (voucher creation); every other exchange is
//! pure network I/O.

use super::error::ExchangeError;
use super::interface::{EventData, EventStream, Exchange};
use crate::multicodec::TRANSPORT_GRAPHSYNC_FILECOINV1;
use crate::planning::TransportRequest;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The CBOR-decoded tail of a paid-retrieval provider's metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct PaidRetrievalMetadata {
    #[serde(rename = "PieceCID")]
    pub piece_cid: String,
    #[serde(rename = "VerifiedDeal")]
    pub verified_deal: bool,
    #[serde(rename = "FastRetrieval")]
    pub fast_retrieval: bool,
}

impl PaidRetrievalMetadata {
    pub fn decode(bytes: &[u8]) -> Result<Self, ExchangeError> {
        ciborium::de::from_reader(bytes)
            .map_err(|e| ExchangeError::Transport(format!("malformed paid-retrieval metadata: {e}")))
    }
}

/// A signed micro-payment voucher, minted in response to a "funds needed"
/// interrupt from the data-transfer channel.
#[derive(Debug, Clone)]
pub struct Voucher {
    pub amount: u64,
    pub signature: Vec<u8>,
}

/// Mints payment vouchers and tracks deal funding. Out-of-scope machinery,
/// injected as a capability.
#[async_trait]
pub trait PaymentApi: Send + Sync {
    async fn mint_voucher(&self, deal_id: &str, amount: u64) -> Result<Voucher, ExchangeError>;
}

/// A single funds-needed interrupt or data chunk from an open deal channel.
#[derive(Debug)]
pub enum ChannelEvent {
    FundsNeeded { amount: u64 },
    Data(bytes::Bytes),
    Complete,
}

/// Negotiates a deal and drives its pull-style data-transfer channel.
/// Out-of-scope machinery, injected as a capability.
#[async_trait]
pub trait DataTransferManager: Send + Sync {
    async fn open_deal(
        &self,
        piece_cid: &str,
        provider: &crate::routing::Provider,
    ) -> Result<String, ExchangeError>;

    async fn next_channel_event(&self, deal_id: &str) -> Result<Option<ChannelEvent>, ExchangeError>;
}

pub struct PaidRetrievalExchange {
    data_transfer: Arc<dyn DataTransferManager>,
    payment: Arc<dyn PaymentApi>,
}

impl PaidRetrievalExchange {
    pub fn new(data_transfer: Arc<dyn DataTransferManager>, payment: Arc<dyn PaymentApi>) -> Self {
        PaidRetrievalExchange { data_transfer, payment }
    }
}

impl Exchange for PaidRetrievalExchange {
    fn code(&self) -> u64 {
        TRANSPORT_GRAPHSYNC_FILECOINV1
    }

    fn request_data(&self, ctx: CancellationToken, request: &TransportRequest) -> EventStream {
        let metadata = match PaidRetrievalMetadata::decode(&request.metadata) {
            Ok(m) => m,
            Err(e) => {
                return Box::pin(futures::stream::once(async move { EventData::failure(e) }));
            }
        };
        let data_transfer = self.data_transfer.clone();
        let payment = self.payment.clone();
        let provider = request.provider.clone();

        Box::pin(async_stream::stream! {
            yield EventData::start();

            let deal_id = match data_transfer.open_deal(&metadata.piece_cid, &provider).await {
                Ok(id) => id,
                Err(e) => {
                    yield EventData::failure(e);
                    return;
                }
            };

            loop {
                if ctx.is_cancelled() {
                    yield EventData::failure(ExchangeError::Transport("cancelled".into()));
                    return;
                }
                match data_transfer.next_channel_event(&deal_id).await {
                    Ok(Some(ChannelEvent::FundsNeeded { amount })) => {
                        if let Err(e) = payment.mint_voucher(&deal_id, amount).await {
                            yield EventData::failure(e);
                            return;
                        }
                    }
                    Ok(Some(ChannelEvent::Data(_))) => {
                        // Block bytes are handed to the traversal layer by the
                        // data-transfer manager directly (out of scope here);
                        // only the event's occurrence is observable.
                    }
                    Ok(Some(ChannelEvent::Complete)) => break,
                    Ok(None) => break,
                    Err(e) => {
                        yield EventData::failure(e);
                        return;
                    }
                }
            }

            yield EventData::success();
        })
    }
}
