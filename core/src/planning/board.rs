use super::plan::TransportRequest;
use crate::routing::ProviderIdentity;
use parking_lot::Mutex;
use uuid::Uuid;

struct State {
    possible: Vec<TransportRequest>,
    pending: Vec<TransportRequest>,
    complete: Vec<TransportRequest>,
    failed: Vec<TransportRequest>,
}

/// Four disjoint sets of in-flight attempts for one `Get`. Every
/// request is in exactly one set; the only legal transitions are
/// `Possible -> Pending` (`begin`) and `Pending -> Complete | Failed`
/// (`reconcile`). Guarded by a single lock, held only for pure in-memory
/// vector mutation — never across an await point.
pub struct Board {
    state: Mutex<State>,
}

impl Board {
    pub fn new() -> Self {
        Board {
            state: Mutex::new(State {
                possible: Vec::new(),
                pending: Vec::new(),
                complete: Vec::new(),
                failed: Vec::new(),
            }),
        }
    }

    pub fn add_possible(&self, request: TransportRequest) {
        tracing::debug!(id = %request.id(), provider = %request.provider.canonical_id(), "possible");
        self.state.lock().possible.push(request);
    }

    /// Moves `id` from Possible to Pending. No-op if absent.
    pub fn begin(&self, id: Uuid) -> bool {
        let mut state = self.state.lock();
        if let Some(pos) = state.possible.iter().position(|r| r.id() == id) {
            let request = state.possible.remove(pos);
            state.pending.push(request);
            tracing::debug!(%id, "possible -> pending");
            true
        } else {
            false
        }
    }

    /// Moves `id` from Pending to Complete (if `success`) or Failed. No-op if
    /// absent from Pending.
    pub fn reconcile(&self, id: Uuid, success: bool) -> bool {
        let mut state = self.state.lock();
        if let Some(pos) = state.pending.iter().position(|r| r.id() == id) {
            let request = state.pending.remove(pos);
            if success {
                state.complete.push(request);
                tracing::debug!(%id, "pending -> complete");
            } else {
                state.failed.push(request);
                tracing::debug!(%id, "pending -> failed");
            }
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> bool {
        let state = self.state.lock();
        !state.possible.is_empty() || !state.pending.is_empty()
    }

    pub fn pending_is_empty(&self) -> bool {
        self.state.lock().pending.is_empty()
    }

    /// The Possible entry with maximum score, ties broken by earliest
    /// insertion (a strict `>` comparison during the scan preserves this,
    /// since `possible` is insertion-ordered).
    pub fn highest_score(&self) -> Option<TransportRequest> {
        let state = self.state.lock();
        if state.possible.is_empty() {
            return None;
        }

        let mut best: Option<(&TransportRequest, i64)> = None;
        for candidate in &state.possible {
            let score = Self::score(candidate, &state);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }
        best.map(|(request, _)| request.clone())
    }

    fn score(candidate: &TransportRequest, state: &State) -> i64 {
        let mut s: i64 = 0;
        let id = candidate.provider.canonical_id();
        for g in &state.complete {
            if g.provider.canonical_id() == id {
                s += 1;
            }
        }
        for f in &state.failed {
            if f.provider.canonical_id() == id {
                s -= 5;
            }
        }
        for p in &state.pending {
            if p.provider.canonical_id() == id {
                s -= 1;
            }
        }
        s
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cid;
    use crate::link::Link;
    use crate::multicodec::RAW;
    use crate::routing::{Provider, ProviderIdentity};
    use crate::selector::Selector;
    use bytes::Bytes;
    use libp2p::PeerId;
    use std::sync::Arc;

    fn request(peer: PeerId) -> TransportRequest {
        let root = Link::new(cid::of(RAW, b"root"));
        let provider = Arc::new(Provider {
            peer_id: peer,
            addrs: vec![],
        });
        TransportRequest::new(RAW, root, Selector::MatchRoot, provider, Bytes::new())
    }

    #[test]
    fn sets_stay_disjoint_across_the_full_lifecycle() {
        let board = Board::new();
        let r = request(PeerId::random());
        let id = r.id();
        board.add_possible(r);
        assert!(board.active());

        assert!(board.begin(id));
        assert!(!board.begin(id), "begin is a no-op once already pending");

        assert!(board.reconcile(id, true));
        assert!(!board.reconcile(id, false), "reconcile is a no-op once terminal");
        assert!(!board.active());
    }

    #[test]
    fn highest_score_prefers_a_providers_past_success() {
        let board = Board::new();
        let peer_a = PeerId::random();
        let peer_b = PeerId::random();

        let succeeded = request(peer_a);
        let succeeded_id = succeeded.id();
        board.add_possible(succeeded);
        board.begin(succeeded_id);
        board.reconcile(succeeded_id, true);

        let candidate_a = request(peer_a);
        let candidate_a_id = candidate_a.id();
        board.add_possible(candidate_a);
        let candidate_b = request(peer_b);
        board.add_possible(candidate_b);

        let best = board.highest_score().unwrap();
        assert_eq!(best.id(), candidate_a_id);
    }

    #[test]
    fn ties_break_to_earliest_insertion() {
        let board = Board::new();
        let first = request(PeerId::random());
        let first_id = first.id();
        board.add_possible(first);
        board.add_possible(request(PeerId::random()));

        let best = board.highest_score().unwrap();
        assert_eq!(best.id(), first_id);
    }

    #[test]
    fn failed_providers_are_penalised_more_than_pending_ones() {
        let board = Board::new();
        let peer_failed = PeerId::random();
        let peer_pending = PeerId::random();

        let failed = request(peer_failed);
        let failed_id = failed.id();
        board.add_possible(failed);
        board.begin(failed_id);
        board.reconcile(failed_id, false);

        let pending = request(peer_pending);
        let pending_id = pending.id();
        board.add_possible(pending);
        board.begin(pending_id);

        let candidate_failed = request(peer_failed);
        let candidate_failed_id = candidate_failed.id();
        board.add_possible(candidate_failed);
        let candidate_pending = request(peer_pending);
        let candidate_pending_id = candidate_pending.id();
        board.add_possible(candidate_pending);

        let _ = pending_id;
        let best = board.highest_score().unwrap();
        assert_eq!(best.id(), candidate_pending_id);
        assert_ne!(best.id(), candidate_failed_id);
    }
}
