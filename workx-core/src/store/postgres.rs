use super::{AcceptanceClaim, EntityStore, ProposalLedger, StoreError};
use crate::entities::channel::GetChannels;
use crate::entities::employer::{GetEmployerById, GetInterestedEmployers};
use crate::entities::job::GetJobById;
use crate::entities::proposal::{GetProposal, MarkProposalProcessed};
use crate::entities::review::GetReview;
use crate::entities::text::GetTextBySlug;
use crate::entities::worker::{GetInterestedWorkers, GetWorkerById};
use crate::entities::{
    BroadcastChannel, ChannelAudience, Employer, EmployerId, Job, JobId, Proposal, ProposalRef,
    Review, ReviewRef, Worker, WorkerId,
};
use crate::framework::DatabaseProcessor;
use crate::render::{Locale, TemplateKey, TemplateProvider};
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;
use tracing::debug;

/// PostgreSQL-backed [`EntityStore`] and [`ProposalLedger`].
pub struct PgStore {
    db: DatabaseProcessor,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            db: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn worker(&self, id: WorkerId) -> Result<Option<Worker>, StoreError> {
        Ok(self.db.process(GetWorkerById { worker_id: id }).await?)
    }

    async fn job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.db.process(GetJobById { job_id: id }).await?)
    }

    async fn employer(&self, id: EmployerId) -> Result<Option<Employer>, StoreError> {
        Ok(self.db.process(GetEmployerById { employer_id: id }).await?)
    }

    async fn proposal(&self, proposal: ProposalRef) -> Result<Option<Proposal>, StoreError> {
        Ok(self.db.process(GetProposal { proposal }).await?)
    }

    async fn review(&self, review: ReviewRef) -> Result<Option<Review>, StoreError> {
        Ok(self.db.process(GetReview { review }).await?)
    }

    async fn interested_workers(&self, job: &Job) -> Result<Vec<Worker>, StoreError> {
        if !job.is_eligible() {
            return Ok(Vec::new());
        }
        Ok(self.db.process(GetInterestedWorkers::for_job(job)).await?)
    }

    async fn interested_employers(&self, worker: &Worker) -> Result<Vec<Employer>, StoreError> {
        if !worker.is_eligible() {
            return Ok(Vec::new());
        }
        Ok(self
            .db
            .process(GetInterestedEmployers::for_worker(worker))
            .await?)
    }

    async fn channels(
        &self,
        audience: ChannelAudience,
    ) -> Result<Vec<BroadcastChannel>, StoreError> {
        Ok(self.db.process(GetChannels { audience }).await?)
    }
}

/// A proposal held under a pair advisory lock and a row lock inside an open
/// transaction. Dropping it rolls the transaction back.
pub struct PgAcceptanceClaim {
    tx: sqlx::Transaction<'static, sqlx::Postgres>,
    proposal: Proposal,
}

#[async_trait]
impl AcceptanceClaim for PgAcceptanceClaim {
    fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    async fn has_prior_acceptance(&mut self) -> Result<bool, StoreError> {
        Ok(Proposal::has_prior_acceptance_tx(&mut self.tx, &self.proposal).await?)
    }

    async fn complete(mut self) -> Result<bool, StoreError> {
        let flipped = Proposal::mark_processed_tx(&mut self.tx, self.proposal.reference()).await?;
        self.tx.commit().await?;
        Ok(flipped)
    }
}

#[async_trait]
impl ProposalLedger for PgStore {
    type Claim = PgAcceptanceClaim;

    async fn open_acceptance(
        &self,
        proposal: ProposalRef,
    ) -> Result<Option<PgAcceptanceClaim>, StoreError> {
        let Some(current) = self.db.process(GetProposal { proposal }).await? else {
            return Ok(None);
        };
        if !current.awaits_report() {
            debug!(proposal = %proposal, state = ?current.state(), "Proposal does not await a report");
            return Ok(None);
        }

        let mut tx = self.db.pool.begin().await?;
        Proposal::lock_pair_tx(&mut tx, current.worker_id, current.employer_id).await?;
        // Another claim may have completed while we waited for the lock.
        let locked = match Proposal::get_for_update_tx(&mut tx, proposal).await? {
            Some(locked) if locked.awaits_report() => locked,
            _ => return Ok(None),
        };
        Ok(Some(PgAcceptanceClaim {
            tx,
            proposal: locked,
        }))
    }

    async fn mark_processed(&self, proposal: ProposalRef) -> Result<bool, StoreError> {
        Ok(self.db.process(MarkProposalProcessed { proposal }).await?)
    }
}

/// Templates from the `texts` table.
pub struct PgTemplates {
    db: DatabaseProcessor,
}

impl PgTemplates {
    pub fn new(pool: PgPool) -> Self {
        Self {
            db: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl TemplateProvider for PgTemplates {
    async fn get(&self, key: TemplateKey, locale: Locale) -> Result<Option<String>, StoreError> {
        let text = self.db.process(GetTextBySlug { slug: key.slug() }).await?;
        Ok(text.map(|text| match locale {
            Locale::Hebrew => text.heb,
            Locale::Russian => text.rus,
        }))
    }
}
