//! Storage seams used by the notification center.
//!
//! [`EntityStore`] reads profiles, listings and channels. [`ProposalLedger`]
//! owns the accepted-proposal critical section: a claim is exclusive per
//! worker/employer pair and completing it flips `is_processed` exactly once.

mod postgres;

pub use postgres::{PgAcceptanceClaim, PgStore, PgTemplates};

use crate::entities::{
    BroadcastChannel, ChannelAudience, Employer, EmployerId, Job, JobId, Proposal, ProposalRef,
    Review, ReviewRef, Worker, WorkerId,
};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn worker(&self, id: WorkerId) -> Result<Option<Worker>, StoreError>;

    async fn job(&self, id: JobId) -> Result<Option<Job>, StoreError>;

    async fn employer(&self, id: EmployerId) -> Result<Option<Employer>, StoreError>;

    async fn proposal(&self, proposal: ProposalRef) -> Result<Option<Proposal>, StoreError>;

    async fn review(&self, review: ReviewRef) -> Result<Option<Review>, StoreError>;

    /// Workers matching `job`. Empty when the job itself is not eligible.
    async fn interested_workers(&self, job: &Job) -> Result<Vec<Worker>, StoreError>;

    /// Employers owning at least one job matching `worker`, each once.
    /// Empty when the worker itself is not eligible.
    async fn interested_employers(&self, worker: &Worker) -> Result<Vec<Employer>, StoreError>;

    async fn channels(&self, audience: ChannelAudience)
    -> Result<Vec<BroadcastChannel>, StoreError>;
}

#[async_trait]
pub trait ProposalLedger: Send + Sync {
    type Claim: AcceptanceClaim;

    /// Take the exclusive hold on an accepted, unprocessed proposal.
    ///
    /// Waits while another claim on the same pair is open. Returns `None` if
    /// the proposal does not exist, is not accepted, or has already been
    /// processed by the time the hold is granted.
    async fn open_acceptance(
        &self,
        proposal: ProposalRef,
    ) -> Result<Option<Self::Claim>, StoreError>;

    /// Set `is_processed` if it is still unset. Returns whether this call
    /// changed it; a second call returns `false`.
    async fn mark_processed(&self, proposal: ProposalRef) -> Result<bool, StoreError>;
}

/// An open hold on one accepted proposal.
///
/// Dropping the claim without completing it releases the hold and leaves the
/// proposal accepted and unprocessed.
#[async_trait]
pub trait AcceptanceClaim: Send {
    /// The proposal as read under the hold.
    fn proposal(&self) -> &Proposal;

    /// Whether another proposal between the same worker and employer, from
    /// either side, was already accepted and processed.
    async fn has_prior_acceptance(&mut self) -> Result<bool, StoreError>;

    /// Mark the proposal processed and release the hold.
    async fn complete(self) -> Result<bool, StoreError>;
}
