//! # Request Registry
//!
//! Dual-indexed store of outstanding requests.
//!
//! ## Data Structures
//!
//! - `forward`: target → initiator → request ("who has sent me requests")
//! - `reverse`: initiator → target → request ("what have I sent")
//!
//! Both maps sit behind one `RwLock` and are only mutated together, so no
//! caller ever sees a request in one index but not the other. Empty inner
//! maps are removed with their last entry.

use super::entities::Request;
use parking_lot::RwLock;
use rv_01_expiry_scheduler::ExpiryScheduler;
use shared_types::{ParticipantId, RequestId, RequestState};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type Bucket = HashMap<ParticipantId, Arc<Request>>;

#[derive(Debug, Default)]
struct Indices {
    forward: HashMap<ParticipantId, Bucket>,
    reverse: HashMap<ParticipantId, Bucket>,
}

impl Indices {
    fn insert(&mut self, request: Arc<Request>) -> Option<Arc<Request>> {
        let (initiator, target) = (request.initiator(), request.target());
        self.reverse
            .entry(initiator)
            .or_default()
            .insert(target, request.clone());
        self.forward
            .entry(target)
            .or_default()
            .insert(initiator, request)
    }

    fn get(&self, initiator: &ParticipantId, target: &ParticipantId) -> Option<&Arc<Request>> {
        self.forward.get(target).and_then(|b| b.get(initiator))
    }

    fn remove(&mut self, initiator: &ParticipantId, target: &ParticipantId) -> Option<Arc<Request>> {
        let removed = take_from(&mut self.forward, target, initiator);
        let mirrored = take_from(&mut self.reverse, initiator, target);
        debug_assert_eq!(
            removed.as_ref().map(|r| r.id()),
            mirrored.as_ref().map(|r| r.id())
        );
        removed
    }
}

/// Remove `outer[key][inner]`, dropping the bucket once it is empty.
fn take_from(
    outer: &mut HashMap<ParticipantId, Bucket>,
    key: &ParticipantId,
    inner: &ParticipantId,
) -> Option<Arc<Request>> {
    let bucket = outer.get_mut(key)?;
    let removed = bucket.remove(inner);
    if bucket.is_empty() {
        outer.remove(key);
    }
    removed
}

/// Concurrent registry of outstanding requests, one per ordered pair.
pub struct RequestRegistry {
    indices: RwLock<Indices>,
    scheduler: Arc<ExpiryScheduler<Request>>,
}

impl RequestRegistry {
    /// Every inserted request is also queued on `scheduler`.
    #[must_use]
    pub fn new(scheduler: Arc<ExpiryScheduler<Request>>) -> Self {
        Self {
            indices: RwLock::new(Indices::default()),
            scheduler,
        }
    }

    #[must_use]
    pub fn scheduler(&self) -> &Arc<ExpiryScheduler<Request>> {
        &self.scheduler
    }

    /// Register `request` under its (initiator, target) pair.
    ///
    /// A previous request for the same pair is unlinked and returned with
    /// its state untouched; it resolves through its own expiry.
    pub fn insert(&self, request: Arc<Request>) -> Option<Arc<Request>> {
        let evicted = self.indices.write().insert(request.clone());
        if let Some(old) = &evicted {
            debug!(
                evicted = %old.id(),
                replacement = %request.id(),
                "Request replaced for the same pair"
            );
        }
        self.scheduler.add(request);
        evicted
    }

    #[must_use]
    pub fn lookup(&self, initiator: &ParticipantId, target: &ParticipantId) -> Option<Arc<Request>> {
        self.indices.read().get(initiator, target).cloned()
    }

    /// Initiators with a request outstanding towards `target`, in id order.
    #[must_use]
    pub fn list_senders_to(&self, target: &ParticipantId) -> Vec<ParticipantId> {
        let mut senders: Vec<_> = self
            .indices
            .read()
            .forward
            .get(target)
            .map(|bucket| bucket.keys().copied().collect())
            .unwrap_or_default();
        senders.sort_unstable();
        senders
    }

    /// Requests `initiator` has outstanding, ordered by target id.
    #[must_use]
    pub fn list_initiated_by(&self, initiator: &ParticipantId) -> Vec<Arc<Request>> {
        let mut requests: Vec<_> = self
            .indices
            .read()
            .reverse
            .get(initiator)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default();
        requests.sort_unstable_by_key(|r| r.target());
        requests
    }

    /// Unlink whatever request is registered for the pair.
    pub fn remove(&self, initiator: &ParticipantId, target: &ParticipantId) -> Option<Arc<Request>> {
        self.indices.write().remove(initiator, target)
    }

    /// Unlink `request` only if it is still the one registered for its pair.
    pub fn remove_request(&self, request: &Request) -> bool {
        self.remove_entry(&request.initiator(), &request.target(), request.id())
    }

    /// Unlink the pair's entry if its id is `id`.
    pub fn remove_entry(
        &self,
        initiator: &ParticipantId,
        target: &ParticipantId,
        id: RequestId,
    ) -> bool {
        let mut indices = self.indices.write();
        if indices.get(initiator, target).map(|r| r.id()) != Some(id) {
            return false;
        }
        indices.remove(initiator, target).is_some()
    }

    /// Sweep every request `participant` is part of.
    ///
    /// Requests targeting them become `TargetOffline`, requests they
    /// initiated become `InitiatorOffline`, and all are unlinked in one
    /// exclusive section. Returns the requests this sweep moved to an
    /// offline state; ones another path already resolved are unlinked
    /// silently.
    pub fn mark_offline(&self, participant: &ParticipantId) -> Vec<Arc<Request>> {
        let mut indices = self.indices.write();
        let mut swept = Vec::new();

        if let Some(incoming) = indices.forward.remove(participant) {
            for (initiator, request) in incoming {
                take_from(&mut indices.reverse, &initiator, participant);
                if request.transition(RequestState::TargetOffline).is_committed() {
                    swept.push(request);
                }
            }
        }

        if let Some(outgoing) = indices.reverse.remove(participant) {
            for (target, request) in outgoing {
                take_from(&mut indices.forward, &target, participant);
                if request
                    .transition(RequestState::InitiatorOffline)
                    .is_committed()
                {
                    swept.push(request);
                }
            }
        }

        drop(indices);
        if !swept.is_empty() {
            debug!(participant = %participant, swept = swept.len(), "Swept requests of offline participant");
        }
        swept
    }

    /// Unlink everything.
    pub fn clear(&self) {
        let mut indices = self.indices.write();
        indices.forward.clear();
        indices.reverse.clear();
    }

    /// Number of outstanding pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.read().reverse.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.read().reverse.is_empty()
    }

    /// Whether both indices hold exactly the same pairs and no empty buckets.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let indices = self.indices.read();
        let no_empty = indices.forward.values().all(|b| !b.is_empty())
            && indices.reverse.values().all(|b| !b.is_empty());

        let forward_in_reverse = indices.forward.iter().all(|(target, bucket)| {
            bucket.iter().all(|(initiator, request)| {
                indices
                    .reverse
                    .get(initiator)
                    .and_then(|b| b.get(target))
                    .is_some_and(|r| r.id() == request.id())
            })
        });
        let forward_len: usize = indices.forward.values().map(HashMap::len).sum();
        let reverse_len: usize = indices.reverse.values().map(HashMap::len).sum();

        no_empty && forward_in_reverse && forward_len == reverse_len
    }
}
