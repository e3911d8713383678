//! Duplicate-acceptance guard.
//!
//! An accepted proposal is reported to the admins once. The report is
//! rendered and delivered while a claim on the proposal is held, and the
//! claim is completed (proposal marked processed) only after the admin chat
//! accepted the message. A pair that already had an accepted proposal gets
//! a warning banner in front of the report.

use crate::dispatch::FanoutDispatcher;
use crate::entities::{ChatId, ProposalRef};
use crate::processors::NotifyError;
use crate::render::{Locale, MessageRenderer, ProposalReport};
use crate::store::{AcceptanceClaim, EntityStore, ProposalLedger};
use tracing::{debug, info, warn};
use workx_sdk::objects::Payload;

/// The admin report for one claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptanceReport {
    pub payload: Payload,
    /// The pair already had an accepted and processed proposal.
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptanceOutcome {
    /// Missing, not accepted, or already processed.
    NotPending,
    /// The worker, employer or job the proposal points at is gone.
    MissingParty,
    Reported { is_duplicate: bool },
    /// The admin chat refused the report. The proposal stays unprocessed.
    DeliveryFailed,
}

/// Render the admin report for the proposal held by `claim`.
///
/// Returns `None` when the worker or employer no longer exists. A missing
/// job only drops the job section.
pub async fn on_proposal_accepted<C: AcceptanceClaim>(
    claim: &mut C,
    store: &dyn EntityStore,
    renderer: &MessageRenderer<'_>,
    locale: Locale,
) -> Result<Option<AcceptanceReport>, NotifyError> {
    let proposal = claim.proposal().clone();
    let Some(worker) = store.worker(proposal.worker_id).await? else {
        return Ok(None);
    };
    let Some(employer) = store.employer(proposal.employer_id).await? else {
        return Ok(None);
    };
    let job = match proposal.job_id {
        Some(job_id) => store.job(job_id).await?,
        None => None,
    };

    let is_duplicate = claim.has_prior_acceptance().await?;
    let report = ProposalReport {
        proposal: &proposal,
        worker: &worker,
        employer: &employer,
        job: job.as_ref(),
        is_duplicate,
    };
    let payload = renderer.proposal_report(&report, locale).await?;
    Ok(Some(AcceptanceReport {
        payload,
        is_duplicate,
    }))
}

/// Claim, render, deliver to `admin_chat`, then complete the claim.
///
/// Concurrent calls for proposals of the same worker/employer pair run one
/// after another. A second call for the same proposal finds it processed.
pub async fn report_acceptance<L>(
    ledger: &L,
    store: &dyn EntityStore,
    renderer: &MessageRenderer<'_>,
    dispatcher: &FanoutDispatcher,
    admin_chat: ChatId,
    locale: Locale,
    proposal: ProposalRef,
) -> Result<AcceptanceOutcome, NotifyError>
where
    L: ProposalLedger,
{
    let Some(mut claim) = ledger.open_acceptance(proposal).await? else {
        debug!(proposal = %proposal, "No accepted, unprocessed proposal to report");
        return Ok(AcceptanceOutcome::NotPending);
    };
    let Some(report) = on_proposal_accepted(&mut claim, store, renderer, locale).await? else {
        debug!(proposal = %proposal, "Proposal refers to a missing worker or employer");
        return Ok(AcceptanceOutcome::MissingParty);
    };

    if let Err(e) = dispatcher.deliver(admin_chat, &report.payload).await {
        warn!(proposal = %proposal, chat = %admin_chat, error = %e, "Failed to deliver proposal report");
        return Ok(AcceptanceOutcome::DeliveryFailed);
    }
    if !claim.complete().await? {
        warn!(proposal = %proposal, "Proposal was already processed when the claim completed");
    }
    info!(
        proposal = %proposal,
        duplicate = report.is_duplicate,
        "Reported accepted proposal"
    );
    Ok(AcceptanceOutcome::Reported {
        is_duplicate: report.is_duplicate,
    })
}
