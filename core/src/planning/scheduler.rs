use super::board::Board;
use super::plan::{PlanError, TransportPlan, TransportRequest};
use crate::cid::Cid;
use crate::link::Link;
use crate::routing::RecordStream;
use crate::routing::RoutingRecord;
use crate::selector::Selector;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub type PlanStream = Pin<Box<dyn Stream<Item = TransportPlan> + Send>>;

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Owns one [`Board`] and drives it for the lifetime of a single `Get`
///. `begin`/`reconcile` are funneled through here rather than the
/// session touching the board directly, preserving the board's single-owner
/// property.
pub struct Scheduler {
    board: Arc<Board>,
    tick_interval: Duration,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::with_tick_interval(DEFAULT_TICK_INTERVAL)
    }

    pub fn with_tick_interval(tick_interval: Duration) -> Self {
        Scheduler {
            board: Arc::new(Board::new()),
            tick_interval,
        }
    }

    pub fn begin(&self, id: Uuid) -> bool {
        self.board.begin(id)
    }

    pub fn reconcile(&self, id: Uuid, success: bool) -> bool {
        self.board.reconcile(id, success)
    }

    /// Starts the background tick/ingest loop and returns a lazy stream of
    /// plans. One scheduler serves exactly one `Get`.
    pub fn schedule(
        self: &Arc<Self>,
        ctx: CancellationToken,
        root: Cid,
        selector: Selector,
        records: RecordStream,
    ) -> PlanStream {
        let scheduler = self.clone();
        let (tx, rx) = mpsc::channel(1);

        tokio::spawn(async move {
            let board = &scheduler.board;
            let mut records = records.fuse();
            let mut records_done = false;
            let mut interval = tokio::time::interval(scheduler.tick_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                // Record ingestion is listed before the tick branch so a
                // `biased` select always drains a ready record ahead of
                // scoring a stale board on this iteration.
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => break,
                    maybe_record = records.next(), if !records_done => {
                        match maybe_record {
                            Some(RoutingRecord::Provider { protocol, provider, metadata, .. }) => {
                                let request = TransportRequest::new(
                                    protocol,
                                    Link::new(root),
                                    selector,
                                    Arc::new(provider),
                                    metadata,
                                );
                                board.add_possible(request);
                            }
                            Some(RoutingRecord::Error { cause, .. }) => {
                                tracing::warn!(error = %cause, "indexer returned an error record");
                            }
                            None => {
                                records_done = true;
                                if !board.active() {
                                    let _ = tx.send(TransportPlan::Error(PlanError::NoTransport)).await;
                                    break;
                                }
                            }
                        }
                    }
                    _ = interval.tick() => {
                        if let Some(best) = board.highest_score() {
                            if tx.send(TransportPlan::Requests(vec![best])).await.is_err() {
                                break;
                            }
                        } else if board.pending_is_empty() {
                            if tx.send(TransportPlan::Error(PlanError::NoTransport)).await.is_err() {
                                break;
                            }
                        }
                        if records_done && !board.active() {
                            break;
                        }
                    }
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
