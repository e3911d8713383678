//! NotificationCenter processor.
//!
//! The NotificationCenter is responsible for:
//! - Receiving `NotificationEvent` from the queue
//! - Announcing newly approved workers to employer channels and interested employers
//! - Announcing newly approved jobs to worker channels and interested workers
//! - Reporting accepted proposals and new reviews to the admin chats
//!
//! Every event is handled in its own task. Recipients inside one fanout are
//! served one after another with a pause between sends, so a large fanout
//! only delays itself.

use crate::config::{ConfigStore, NotificationConfig};
use crate::dispatch::{FanoutDispatcher, FanoutReport, Pacer, Recipient, Transport};
use crate::entities::{ChannelAudience, Job, ProposalRef, ReviewOrigin, ReviewRef, Worker};
use crate::events::{NotificationEvent, NotificationEventReceiver};
use crate::guard::{AcceptanceOutcome, report_acceptance};
use crate::render::{Audience, MessageRenderer, RenderError, TemplateProvider};
use crate::store::{EntityStore, ProposalLedger, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;
use workx_sdk::objects::Payload;

/// Errors that abandon the handling of one event.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Outcome of announcing a new worker or job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnouncementReport {
    pub channels: FanoutReport,
    pub direct: FanoutReport,
}

struct CenterInner<S> {
    store: Arc<S>,
    templates: Arc<dyn TemplateProvider>,
    dispatcher: FanoutDispatcher,
    config: ConfigStore<NotificationConfig>,
}

/// Turns notification events into delivered messages.
pub struct NotificationCenter<S> {
    inner: Arc<CenterInner<S>>,
}

impl<S> Clone for NotificationCenter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> NotificationCenter<S>
where
    S: EntityStore + ProposalLedger + 'static,
{
    pub fn new(
        store: Arc<S>,
        templates: Arc<dyn TemplateProvider>,
        transport: Arc<dyn Transport>,
        pacer: Arc<dyn Pacer>,
        config: ConfigStore<NotificationConfig>,
    ) -> Self {
        Self {
            inner: Arc::new(CenterInner {
                store,
                templates,
                dispatcher: FanoutDispatcher::new(transport, pacer),
                config,
            }),
        }
    }

    fn renderer(&self) -> MessageRenderer<'_> {
        MessageRenderer::new(self.inner.templates.as_ref())
    }

    /// Run the NotificationCenter until shutdown.
    ///
    /// Each received event is handled in its own task. On shutdown the
    /// center stops receiving and waits for the running tasks to finish.
    pub async fn run(
        self,
        mut event_rx: NotificationEventReceiver,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("NotificationCenter started");
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("NotificationCenter received shutdown signal");
                        break;
                    }
                }

                Some(event) = event_rx.recv() => {
                    let event_id = Uuid::now_v7();
                    debug!(event_id = %event_id, event = ?event, "Received NotificationEvent");
                    let span = info_span!("notification", event_id = %event_id, kind = event.kind());
                    let center = self.clone();
                    tasks.spawn(
                        async move {
                            if let Err(e) = center.handle(event).await {
                                error!(error = %e, "Abandoned notification event");
                            }
                        }
                        .instrument(span),
                    );
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Notification task failed");
                    }
                }

                else => {
                    info!("NotificationEvent channel closed");
                    break;
                }
            }
        }

        if !tasks.is_empty() {
            info!(in_flight = tasks.len(), "Waiting for in-flight notifications");
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Notification task failed");
            }
        }
        info!("NotificationCenter shutdown complete");
    }

    /// Resolve the identifiers an event carries and notify.
    ///
    /// An entity that no longer exists makes the event a no-op.
    pub async fn handle(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        match event {
            NotificationEvent::WorkerApproved { worker_id } => {
                match self.inner.store.worker(worker_id).await? {
                    Some(worker) => {
                        self.notify_new_worker(&worker).await;
                    }
                    None => debug!(worker_id = %worker_id, "Worker not found, nothing to announce"),
                }
            }
            NotificationEvent::JobApproved { job_id } => {
                match self.inner.store.job(job_id).await? {
                    Some(job) => {
                        self.notify_new_job(&job).await;
                    }
                    None => debug!(job_id = %job_id, "Job not found, nothing to announce"),
                }
            }
            NotificationEvent::ProposalAccepted { proposal } => {
                self.handle_proposal_accepted(proposal).await?;
            }
            NotificationEvent::ReviewSubmitted { review } => {
                self.notify_review(review).await?;
            }
        }
        Ok(())
    }

    /// Announce an approved worker: employer channels first, then every
    /// employer owning a matching job.
    ///
    /// The two halves fail independently. A worker that is not approved is
    /// not announced at all.
    pub async fn notify_new_worker(&self, worker: &Worker) -> AnnouncementReport {
        if !worker.is_approved {
            debug!(worker_id = %worker.id, "Worker not approved, skipping announcement");
            return AnnouncementReport::default();
        }
        let config = self.inner.config.snapshot();
        let locale = config.locales.employers;
        let renderer = self.renderer();

        let channels = match self.inner.store.channels(ChannelAudience::Employers).await {
            Ok(channels) => {
                let audience = Audience::Channel {
                    bot_username: &config.bot_username,
                };
                let payload = renderer.new_worker(worker, audience, locale).await;
                self.fanout("employer channels", &channels, payload, config.pacing.channel_delay)
                    .await
            }
            Err(e) => {
                error!(worker_id = %worker.id, error = %e, "Failed to load employer channels");
                FanoutReport::default()
            }
        };

        let direct = match self.inner.store.interested_employers(worker).await {
            Ok(employers) => {
                let payload = renderer.new_worker(worker, Audience::Direct, locale).await;
                self.fanout("interested employers", &employers, payload, config.pacing.direct_delay)
                    .await
            }
            Err(e) => {
                error!(worker_id = %worker.id, error = %e, "Failed to load interested employers");
                FanoutReport::default()
            }
        };

        info!(
            worker_id = %worker.id,
            channels = channels.delivered,
            employers = direct.delivered,
            failed = channels.failed + direct.failed,
            "Announced new worker"
        );
        AnnouncementReport { channels, direct }
    }

    /// Announce an approved job: worker channels first, then every
    /// interested worker.
    pub async fn notify_new_job(&self, job: &Job) -> AnnouncementReport {
        if !job.is_approved {
            debug!(job_id = %job.id, "Job not approved, skipping announcement");
            return AnnouncementReport::default();
        }
        let config = self.inner.config.snapshot();
        let locale = config.locales.workers;
        let renderer = self.renderer();

        let channels = match self.inner.store.channels(ChannelAudience::Workers).await {
            Ok(channels) => {
                let audience = Audience::Channel {
                    bot_username: &config.bot_username,
                };
                let payload = renderer.new_job(job, audience, locale).await;
                self.fanout("worker channels", &channels, payload, config.pacing.channel_delay)
                    .await
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Failed to load worker channels");
                FanoutReport::default()
            }
        };

        let direct = match self.inner.store.interested_workers(job).await {
            Ok(workers) => {
                let payload = renderer.new_job(job, Audience::Direct, locale).await;
                self.fanout("interested workers", &workers, payload, config.pacing.direct_delay)
                    .await
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Failed to load interested workers");
                FanoutReport::default()
            }
        };

        info!(
            job_id = %job.id,
            channels = channels.delivered,
            workers = direct.delivered,
            failed = channels.failed + direct.failed,
            "Announced new job"
        );
        AnnouncementReport { channels, direct }
    }

    async fn fanout<R>(
        &self,
        group: &'static str,
        recipients: &[R],
        payload: Result<Payload, RenderError>,
        delay: Duration,
    ) -> FanoutReport
    where
        R: Recipient + Sync,
    {
        if recipients.is_empty() {
            debug!(group, "No recipients");
            return FanoutReport::default();
        }
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                warn!(group, error = %e, "Message could not be rendered, skipping fanout");
                return FanoutReport::default();
            }
        };
        debug!(group, recipients = recipients.len(), "Starting fanout");
        self.inner
            .dispatcher
            .notify(recipients, |_| Ok(payload.clone()), delay)
            .await
    }

    /// Report a worker's proposal that an employer accepted.
    pub async fn handle_worker_proposal_accepted(
        &self,
        proposal_id: i64,
    ) -> Result<AcceptanceOutcome, NotifyError> {
        self.handle_proposal_accepted(ProposalRef::worker(proposal_id))
            .await
    }

    /// Report an employer's proposal that a worker accepted.
    pub async fn handle_employer_proposal_accepted(
        &self,
        proposal_id: i64,
    ) -> Result<AcceptanceOutcome, NotifyError> {
        self.handle_proposal_accepted(ProposalRef::employer(proposal_id))
            .await
    }

    async fn handle_proposal_accepted(
        &self,
        proposal: ProposalRef,
    ) -> Result<AcceptanceOutcome, NotifyError> {
        let config = self.inner.config.snapshot();
        report_acceptance(
            self.inner.store.as_ref(),
            self.inner.store.as_ref(),
            &self.renderer(),
            &self.inner.dispatcher,
            config.admin.proposals,
            config.locales.admin,
            proposal,
        )
        .await
    }

    /// Forward an employer's review of a worker to the reviews chat.
    pub async fn notify_employer_review(&self, review_id: i64) -> Result<bool, NotifyError> {
        self.notify_review(ReviewRef {
            origin: ReviewOrigin::ByEmployer,
            id: review_id,
        })
        .await
    }

    /// Forward a worker's review of an employer to the reviews chat.
    pub async fn notify_worker_review(&self, review_id: i64) -> Result<bool, NotifyError> {
        self.notify_review(ReviewRef {
            origin: ReviewOrigin::ByWorker,
            id: review_id,
        })
        .await
    }

    /// Returns whether the report was delivered.
    async fn notify_review(&self, review: ReviewRef) -> Result<bool, NotifyError> {
        let store = &self.inner.store;
        let Some(found) = store.review(review).await? else {
            debug!(review_id = review.id, "Review not found");
            return Ok(false);
        };
        let (Some(worker), Some(employer)) = (
            store.worker(found.worker_id).await?,
            store.employer(found.employer_id).await?,
        ) else {
            debug!(review_id = review.id, "Review refers to a missing worker or employer");
            return Ok(false);
        };

        let config = self.inner.config.snapshot();
        let payload = self
            .renderer()
            .review_report(&found, &worker, &employer, config.locales.admin)
            .await?;
        match self
            .inner
            .dispatcher
            .deliver(config.admin.reviews, &payload)
            .await
        {
            Ok(()) => {
                info!(review_id = review.id, origin = ?review.origin, "Reported new review");
                Ok(true)
            }
            Err(e) => {
                warn!(review_id = review.id, error = %e, "Failed to deliver review report");
                Ok(false)
            }
        }
    }
}
