//! Event type definitions.
//!
//! Events carry identifiers rather than full data. The notification center
//! re-fetches current state from the store when it handles them, so an
//! event that arrives late sees the latest profile.

use crate::entities::{JobId, ProposalRef, ReviewOrigin, ReviewRef, WorkerId};
use workx_sdk::objects::NotificationRequest;

/// Something happened that counterparties or admins should hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A worker profile was approved.
    WorkerApproved { worker_id: WorkerId },
    /// A job listing was approved.
    JobApproved { job_id: JobId },
    /// A proposal was accepted by its counterparty.
    ProposalAccepted { proposal: ProposalRef },
    ReviewSubmitted { review: ReviewRef },
}

impl NotificationEvent {
    /// Short name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::WorkerApproved { .. } => "worker_approved",
            NotificationEvent::JobApproved { .. } => "job_approved",
            NotificationEvent::ProposalAccepted { .. } => "proposal_accepted",
            NotificationEvent::ReviewSubmitted { .. } => "review_submitted",
        }
    }
}

impl From<NotificationRequest> for NotificationEvent {
    fn from(request: NotificationRequest) -> Self {
        match request {
            NotificationRequest::WorkerApproved { worker_id } => NotificationEvent::WorkerApproved {
                worker_id: WorkerId(worker_id),
            },
            NotificationRequest::JobApproved { job_id } => NotificationEvent::JobApproved {
                job_id: JobId(job_id),
            },
            NotificationRequest::WorkerProposalAccepted { proposal_id } => {
                NotificationEvent::ProposalAccepted {
                    proposal: ProposalRef::worker(proposal_id),
                }
            }
            NotificationRequest::EmployerProposalAccepted { proposal_id } => {
                NotificationEvent::ProposalAccepted {
                    proposal: ProposalRef::employer(proposal_id),
                }
            }
            NotificationRequest::EmployerReviewSubmitted { review_id } => {
                NotificationEvent::ReviewSubmitted {
                    review: ReviewRef {
                        origin: ReviewOrigin::ByEmployer,
                        id: review_id,
                    },
                }
            }
            NotificationRequest::WorkerReviewSubmitted { review_id } => {
                NotificationEvent::ReviewSubmitted {
                    review: ReviewRef {
                        origin: ReviewOrigin::ByWorker,
                        id: review_id,
                    },
                }
            }
        }
    }
}
