use crate::entities::{EmployerId, JobId, WorkerId};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// Which side initiated a cooperation proposal.
///
/// Each origin has its own table and its own id sequence, so an id is only
/// unique together with its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalOrigin {
    /// A worker offered to work for an employer.
    Worker,
    /// An employer offered a job to a worker.
    Employer,
}

impl ProposalOrigin {
    pub(crate) fn table(self) -> &'static str {
        match self {
            ProposalOrigin::Worker => "worker_proposals",
            ProposalOrigin::Employer => "employer_proposals",
        }
    }
}

impl std::fmt::Display for ProposalOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalOrigin::Worker => f.write_str("worker"),
            ProposalOrigin::Employer => f.write_str("employer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProposalRef {
    pub origin: ProposalOrigin,
    pub id: i64,
}

impl ProposalRef {
    pub fn worker(id: i64) -> Self {
        Self {
            origin: ProposalOrigin::Worker,
            id,
        }
    }

    pub fn employer(id: i64) -> Self {
        Self {
            origin: ProposalOrigin::Employer,
            id,
        }
    }
}

impl std::fmt::Display for ProposalRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.origin, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalState {
    Pending,
    Accepted,
    /// Terminal. The admin report has been delivered.
    Processed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub origin: ProposalOrigin,
    pub id: i64,
    pub worker_id: WorkerId,
    pub employer_id: EmployerId,
    pub job_id: Option<JobId>,
    pub is_accepted: bool,
    pub is_processed: bool,
    pub created_at: time::PrimitiveDateTime,
}

impl Proposal {
    pub fn reference(&self) -> ProposalRef {
        ProposalRef {
            origin: self.origin,
            id: self.id,
        }
    }

    pub fn pair(&self) -> (WorkerId, EmployerId) {
        (self.worker_id, self.employer_id)
    }

    pub fn state(&self) -> ProposalState {
        match (self.is_accepted, self.is_processed) {
            (_, true) => ProposalState::Processed,
            (true, false) => ProposalState::Accepted,
            (false, false) => ProposalState::Pending,
        }
    }

    /// Accepted and not yet reported to the admins.
    pub fn awaits_report(&self) -> bool {
        self.state() == ProposalState::Accepted
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ProposalRow {
    id: i64,
    worker_id: i64,
    employer_id: i64,
    job_id: Option<i64>,
    is_accepted: bool,
    is_processed: bool,
    created_at: time::PrimitiveDateTime,
}

impl ProposalRow {
    fn into_proposal(self, origin: ProposalOrigin) -> Proposal {
        Proposal {
            origin,
            id: self.id,
            worker_id: WorkerId(self.worker_id),
            employer_id: EmployerId(self.employer_id),
            job_id: self.job_id.map(JobId),
            is_accepted: self.is_accepted,
            is_processed: self.is_processed,
            created_at: self.created_at,
        }
    }
}

fn select_proposal_sql(origin: ProposalOrigin, for_update: bool) -> String {
    format!(
        r#"
        SELECT id, worker_id, employer_id, job_id, is_accepted, is_processed, created_at
        FROM {}
        WHERE id = $1
        {}
        "#,
        origin.table(),
        if for_update { "FOR UPDATE" } else { "" }
    )
}

async fn mark_processed_on<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    proposal: ProposalRef,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET is_processed = true WHERE id = $1 AND NOT is_processed",
        proposal.origin.table()
    );
    let result = sqlx::query(&sql)
        .bind(proposal.id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}

impl Proposal {
    /// Serialize every claim on one worker/employer pair for the rest of the
    /// transaction, whichever side created the proposal.
    pub async fn lock_pair_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        worker_id: WorkerId,
        employer_id: EmployerId,
    ) -> Result<(), sqlx::Error> {
        let key = format!("proposal-pair:{worker_id}:{employer_id}");
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(key)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Re-read the proposal with a row lock.
    pub async fn get_for_update_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        proposal: ProposalRef,
    ) -> Result<Option<Proposal>, sqlx::Error> {
        let row = sqlx::query_as::<_, ProposalRow>(&select_proposal_sql(proposal.origin, true))
            .bind(proposal.id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.map(|row| row.into_proposal(proposal.origin)))
    }

    /// Whether any other proposal between the same pair, from either origin,
    /// was already accepted and reported.
    pub async fn has_prior_acceptance_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        proposal: &Proposal,
    ) -> Result<bool, sqlx::Error> {
        let (exclude_worker_side, exclude_employer_side) = match proposal.origin {
            ProposalOrigin::Worker => (Some(proposal.id), None),
            ProposalOrigin::Employer => (None, Some(proposal.id)),
        };
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM worker_proposals
                WHERE worker_id = $1 AND employer_id = $2
                  AND is_accepted AND is_processed
                  AND id IS DISTINCT FROM $3
            ) OR EXISTS (
                SELECT 1 FROM employer_proposals
                WHERE worker_id = $1 AND employer_id = $2
                  AND is_accepted AND is_processed
                  AND id IS DISTINCT FROM $4
            )
            "#,
        )
        .bind(proposal.worker_id)
        .bind(proposal.employer_id)
        .bind(exclude_worker_side)
        .bind(exclude_employer_side)
        .fetch_one(&mut **tx)
        .await?;
        Ok(exists)
    }

    pub async fn mark_processed_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        proposal: ProposalRef,
    ) -> Result<bool, sqlx::Error> {
        mark_processed_on(&mut **tx, proposal).await
    }
}

#[derive(Debug, Clone)]
pub struct GetProposal {
    pub proposal: ProposalRef,
}

impl Processor<GetProposal> for DatabaseProcessor {
    type Output = Option<Proposal>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetProposal")]
    async fn process(&self, query: GetProposal) -> Result<Option<Proposal>, sqlx::Error> {
        let origin = query.proposal.origin;
        let row = sqlx::query_as::<_, ProposalRow>(&select_proposal_sql(origin, false))
            .bind(query.proposal.id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.into_proposal(origin)))
    }
}

#[derive(Debug, Clone)]
/// Flip `is_processed` if it is still false. Outputs whether this call
/// flipped it.
pub struct MarkProposalProcessed {
    pub proposal: ProposalRef,
}

impl Processor<MarkProposalProcessed> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkProposalProcessed")]
    async fn process(&self, query: MarkProposalProcessed) -> Result<bool, sqlx::Error> {
        mark_processed_on(&self.pool, query.proposal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(is_accepted: bool, is_processed: bool) -> Proposal {
        Proposal {
            origin: ProposalOrigin::Employer,
            id: 4,
            worker_id: WorkerId(1),
            employer_id: EmployerId(2),
            job_id: None,
            is_accepted,
            is_processed,
            created_at: time::macros::datetime!(2024-01-01 0:00),
        }
    }

    #[test]
    fn test_state_transitions() {
        assert_eq!(proposal(false, false).state(), ProposalState::Pending);
        assert_eq!(proposal(true, false).state(), ProposalState::Accepted);
        assert_eq!(proposal(true, true).state(), ProposalState::Processed);
        assert!(proposal(true, false).awaits_report());
        assert!(!proposal(true, true).awaits_report());
        assert!(!proposal(false, false).awaits_report());
    }

    #[test]
    fn test_select_sql_targets_origin_table() {
        let sql = select_proposal_sql(ProposalOrigin::Worker, true);
        assert!(sql.contains("FROM worker_proposals"));
        assert!(sql.contains("FOR UPDATE"));
        let sql = select_proposal_sql(ProposalOrigin::Employer, false);
        assert!(sql.contains("FROM employer_proposals"));
        assert!(!sql.contains("FOR UPDATE"));
    }

    #[test]
    fn test_reference_display() {
        assert_eq!(ProposalRef::worker(9).to_string(), "worker#9");
        assert_eq!(proposal(true, false).reference(), ProposalRef::employer(4));
    }
}
