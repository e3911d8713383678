use super::lock;
use crate::entities::{
    BroadcastChannel, ChannelAudience, Employer, EmployerId, Job, JobId, Proposal, ProposalRef,
    Review, ReviewRef, Worker, WorkerId,
};
use crate::matching::{find_interested_employers, find_interested_workers};
use crate::store::{AcceptanceClaim, EntityStore, ProposalLedger, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Default)]
struct MemoryState {
    workers: BTreeMap<WorkerId, Worker>,
    jobs: BTreeMap<JobId, Job>,
    employers: BTreeMap<EmployerId, Employer>,
    proposals: HashMap<ProposalRef, Proposal>,
    reviews: HashMap<ReviewRef, Review>,
    channels: Vec<BroadcastChannel>,
}

type PairLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Debug, Default)]
struct MemoryInner {
    state: Mutex<MemoryState>,
    pair_locks: Mutex<HashMap<(WorkerId, EmployerId), PairLock>>,
}

impl MemoryInner {
    /// The mutex for `pair`. Entries nobody holds or waits on are dropped
    /// first, so the map only tracks pairs with a claim in flight.
    fn pair_lock(&self, pair: (WorkerId, EmployerId)) -> PairLock {
        let mut locks = lock(&self.pair_locks);
        locks.retain(|_, held| Arc::strong_count(held) > 1);
        locks.entry(pair).or_default().clone()
    }

    #[cfg(test)]
    fn tracked_pairs(&self) -> usize {
        lock(&self.pair_locks).len()
    }

    fn proposal(&self, proposal: ProposalRef) -> Option<Proposal> {
        lock(&self.state).proposals.get(&proposal).cloned()
    }

    fn mark_processed(&self, proposal: ProposalRef) -> bool {
        let mut state = lock(&self.state);
        match state.proposals.get_mut(&proposal) {
            Some(stored) if !stored.is_processed => {
                stored.is_processed = true;
                true
            }
            _ => false,
        }
    }
}

/// Entity store and proposal ledger held in process memory.
///
/// Inserting an entity that already exists replaces it. Claims on the same
/// worker/employer pair are serialized by a per-pair async mutex.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_worker(&self, worker: Worker) {
        lock(&self.inner.state).workers.insert(worker.id, worker);
    }

    pub fn insert_job(&self, job: Job) {
        lock(&self.inner.state).jobs.insert(job.id, job);
    }

    pub fn insert_employer(&self, employer: Employer) {
        lock(&self.inner.state).employers.insert(employer.id, employer);
    }

    pub fn insert_proposal(&self, proposal: Proposal) {
        lock(&self.inner.state)
            .proposals
            .insert(proposal.reference(), proposal);
    }

    pub fn insert_review(&self, review: Review) {
        let reference = ReviewRef {
            origin: review.origin,
            id: review.id,
        };
        lock(&self.inner.state).reviews.insert(reference, review);
    }

    pub fn insert_channel(&self, channel: BroadcastChannel) {
        let mut state = lock(&self.inner.state);
        state.channels.retain(|existing| existing.chat_id != channel.chat_id);
        state.channels.push(channel);
    }

    /// Flip a proposal to accepted, as the counterparty's button press would.
    pub fn accept_proposal(&self, proposal: ProposalRef) -> bool {
        let mut state = lock(&self.inner.state);
        match state.proposals.get_mut(&proposal) {
            Some(stored) => {
                stored.is_accepted = true;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn worker(&self, id: WorkerId) -> Result<Option<Worker>, StoreError> {
        Ok(lock(&self.inner.state).workers.get(&id).cloned())
    }

    async fn job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(lock(&self.inner.state).jobs.get(&id).cloned())
    }

    async fn employer(&self, id: EmployerId) -> Result<Option<Employer>, StoreError> {
        Ok(lock(&self.inner.state).employers.get(&id).cloned())
    }

    async fn proposal(&self, proposal: ProposalRef) -> Result<Option<Proposal>, StoreError> {
        Ok(self.inner.proposal(proposal))
    }

    async fn review(&self, review: ReviewRef) -> Result<Option<Review>, StoreError> {
        Ok(lock(&self.inner.state).reviews.get(&review).cloned())
    }

    async fn interested_workers(&self, job: &Job) -> Result<Vec<Worker>, StoreError> {
        let state = lock(&self.inner.state);
        let workers: Vec<Worker> = state.workers.values().cloned().collect();
        Ok(find_interested_workers(job, &workers)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn interested_employers(&self, worker: &Worker) -> Result<Vec<Employer>, StoreError> {
        let state = lock(&self.inner.state);
        let jobs: Vec<Job> = state.jobs.values().cloned().collect();
        let employers: Vec<Employer> = state.employers.values().cloned().collect();
        Ok(find_interested_employers(worker, &jobs, &employers)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn channels(
        &self,
        audience: ChannelAudience,
    ) -> Result<Vec<BroadcastChannel>, StoreError> {
        Ok(lock(&self.inner.state)
            .channels
            .iter()
            .filter(|channel| channel.audience == audience)
            .cloned()
            .collect())
    }
}

/// A proposal held under its pair mutex. Dropping it releases the mutex and
/// changes nothing.
pub struct MemoryClaim {
    inner: Arc<MemoryInner>,
    proposal: Proposal,
    _pair: OwnedMutexGuard<()>,
}

#[async_trait]
impl AcceptanceClaim for MemoryClaim {
    fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    async fn has_prior_acceptance(&mut self) -> Result<bool, StoreError> {
        let own = self.proposal.reference();
        let pair = self.proposal.pair();
        let state = lock(&self.inner.state);
        Ok(state.proposals.values().any(|other| {
            other.reference() != own
                && other.pair() == pair
                && other.is_accepted
                && other.is_processed
        }))
    }

    async fn complete(self) -> Result<bool, StoreError> {
        Ok(self.inner.mark_processed(self.proposal.reference()))
    }
}

#[async_trait]
impl ProposalLedger for MemoryStore {
    type Claim = MemoryClaim;

    async fn open_acceptance(
        &self,
        proposal: ProposalRef,
    ) -> Result<Option<MemoryClaim>, StoreError> {
        let Some(current) = self.inner.proposal(proposal) else {
            return Ok(None);
        };
        if !current.awaits_report() {
            return Ok(None);
        }
        let guard = self.inner.pair_lock(current.pair()).lock_owned().await;
        match self.inner.proposal(proposal) {
            Some(locked) if locked.awaits_report() => Ok(Some(MemoryClaim {
                inner: self.inner.clone(),
                proposal: locked,
                _pair: guard,
            })),
            _ => Ok(None),
        }
    }

    async fn mark_processed(&self, proposal: ProposalRef) -> Result<bool, StoreError> {
        Ok(self.inner.mark_processed(proposal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ProposalOrigin;

    fn proposal(origin: ProposalOrigin, id: i64, accepted: bool, processed: bool) -> Proposal {
        Proposal {
            origin,
            id,
            worker_id: WorkerId(1),
            employer_id: EmployerId(2),
            job_id: None,
            is_accepted: accepted,
            is_processed: processed,
            created_at: time::macros::datetime!(2024-01-01 0:00),
        }
    }

    #[tokio::test]
    async fn test_mark_processed_is_idempotent() {
        let store = MemoryStore::new();
        store.insert_proposal(proposal(ProposalOrigin::Worker, 1, true, false));
        assert!(store.mark_processed(ProposalRef::worker(1)).await.unwrap());
        assert!(!store.mark_processed(ProposalRef::worker(1)).await.unwrap());
        assert!(!store.mark_processed(ProposalRef::worker(99)).await.unwrap());
    }

    #[tokio::test]
    async fn test_claim_only_for_accepted_unprocessed() {
        let store = MemoryStore::new();
        store.insert_proposal(proposal(ProposalOrigin::Worker, 1, false, false));
        store.insert_proposal(proposal(ProposalOrigin::Worker, 2, true, true));
        store.insert_proposal(proposal(ProposalOrigin::Worker, 3, true, false));

        assert!(store.open_acceptance(ProposalRef::worker(1)).await.unwrap().is_none());
        assert!(store.open_acceptance(ProposalRef::worker(2)).await.unwrap().is_none());
        assert!(store.open_acceptance(ProposalRef::worker(4)).await.unwrap().is_none());
        let claim = store.open_acceptance(ProposalRef::worker(3)).await.unwrap();
        assert!(claim.is_some());
    }

    #[tokio::test]
    async fn test_accepting_pending_proposal_makes_it_claimable() {
        let store = MemoryStore::new();
        store.insert_proposal(proposal(ProposalOrigin::Employer, 7, false, false));

        assert!(store.open_acceptance(ProposalRef::employer(7)).await.unwrap().is_none());
        assert!(store.accept_proposal(ProposalRef::employer(7)));
        assert!(!store.accept_proposal(ProposalRef::employer(8)));

        let claim = store
            .open_acceptance(ProposalRef::employer(7))
            .await
            .unwrap()
            .unwrap();
        assert!(claim.proposal().is_accepted);
        assert!(!claim.proposal().is_processed);
    }

    #[tokio::test]
    async fn test_released_pair_locks_are_pruned() {
        let store = MemoryStore::new();
        for id in 1..=5 {
            let mut pending = proposal(ProposalOrigin::Worker, id, true, false);
            pending.worker_id = WorkerId(id);
            store.insert_proposal(pending);
        }

        let held = store.open_acceptance(ProposalRef::worker(1)).await.unwrap();
        for id in 2..=5 {
            let claim = store.open_acceptance(ProposalRef::worker(id)).await.unwrap();
            assert!(claim.unwrap().complete().await.unwrap());
        }
        // pair 1 is still held, pair 5 was the last one inserted
        assert_eq!(store.inner.tracked_pairs(), 2);

        drop(held);
        let again = store.open_acceptance(ProposalRef::worker(1)).await.unwrap();
        assert!(again.is_some());
        assert_eq!(store.inner.tracked_pairs(), 1);
    }

    #[tokio::test]
    async fn test_prior_acceptance_crosses_origins() {
        let store = MemoryStore::new();
        store.insert_proposal(proposal(ProposalOrigin::Employer, 1, true, true));
        store.insert_proposal(proposal(ProposalOrigin::Worker, 1, true, false));

        let mut claim = store
            .open_acceptance(ProposalRef::worker(1))
            .await
            .unwrap()
            .unwrap();
        assert!(claim.has_prior_acceptance().await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_claim_leaves_proposal_unprocessed() {
        let store = MemoryStore::new();
        store.insert_proposal(proposal(ProposalOrigin::Employer, 5, true, false));

        let claim = store.open_acceptance(ProposalRef::employer(5)).await.unwrap();
        drop(claim);
        let again = store
            .open_acceptance(ProposalRef::employer(5))
            .await
            .unwrap()
            .unwrap();
        assert!(again.complete().await.unwrap());
        assert!(
            store
                .open_acceptance(ProposalRef::employer(5))
                .await
                .unwrap()
                .is_none()
        );
    }
}
