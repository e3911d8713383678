//! Event intake body (form bot → notification service).

use serde::{Deserialize, Serialize};

use crate::signature::Signature;

/// An event reported by the form bot or the admin panel.
///
/// Events carry identifiers only; the service re-reads current state from
/// the database when it handles them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationRequest {
    /// A worker profile was approved.
    WorkerApproved { worker_id: i64 },
    /// A job listing was approved.
    JobApproved { job_id: i64 },
    /// An employer accepted a proposal sent by a worker.
    WorkerProposalAccepted { proposal_id: i64 },
    /// A worker accepted a proposal sent by an employer.
    EmployerProposalAccepted { proposal_id: i64 },
    /// An employer reviewed a worker.
    EmployerReviewSubmitted { review_id: i64 },
    /// A worker reviewed an employer.
    WorkerReviewSubmitted { review_id: i64 },
}

impl Signature for NotificationRequest {}
