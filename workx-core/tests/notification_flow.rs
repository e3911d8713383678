use std::sync::Arc;
use std::time::Duration;

use workx_core::config::{
    AdminChats, ConfigStore, LocaleConfig, NotificationConfig, PacingConfig,
};
use workx_core::entities::*;
use workx_core::events::{NotificationEvent, notification_event_channel};
use workx_core::guard::AcceptanceOutcome;
use workx_core::memory::{MemoryStore, RecordingPacer, RecordingTransport, StaticTemplates};
use workx_core::processors::NotificationCenter;
use workx_core::render::{Locale, RTL_EMBEDDING, TemplateKey};
use workx_core::store::ProposalLedger;

const PROPOSALS_CHAT: ChatId = ChatId(-1001);
const REVIEWS_CHAT: ChatId = ChatId(-1002);
const EMPLOYER_CHANNEL: ChatId = ChatId(-2001);
const WORKER_CHANNEL: ChatId = ChatId(-2002);

fn config() -> NotificationConfig {
    NotificationConfig {
        admin: AdminChats {
            proposals: PROPOSALS_CHAT,
            reviews: REVIEWS_CHAT,
        },
        pacing: PacingConfig::default(),
        locales: LocaleConfig::default(),
        bot_username: "workx_bot".to_string(),
    }
}

fn worker(id: i64, zones: &[u8], min_salary: i32) -> Worker {
    Worker {
        id: WorkerId(id),
        chat_id: ChatId(100 + id),
        name: format!("Worker {id}"),
        username: None,
        phone: "+972501234567".to_string(),
        selfie: Some(format!("selfie-{id}")),
        zones: ZoneSet::from_numbers(zones),
        min_salary,
        employment_type: EmploymentType::Permanent,
        about: "Forklift licence".to_string(),
        is_approved: true,
        is_searching: true,
        notifications: true,
    }
}

fn job(id: i64, employer: i64, zones: &[u8], min_salary: i32) -> Job {
    Job {
        id: JobId(id),
        employer_id: EmployerId(employer),
        zones: ZoneSet::from_numbers(zones),
        min_salary,
        employment_type: EmploymentType::Permanent,
        description: "Night shift".to_string(),
        is_approved: true,
        is_active: true,
        notifications: true,
    }
}

fn employer(id: i64) -> Employer {
    Employer {
        id: EmployerId(id),
        chat_id: ChatId(200 + id),
        name: format!("Company {id}"),
        username: Some(format!("company_{id}")),
        phone: "+972507654321".to_string(),
    }
}

fn accepted(origin: ProposalOrigin, id: i64, worker: i64, employer: i64) -> Proposal {
    Proposal {
        origin,
        id,
        worker_id: WorkerId(worker),
        employer_id: EmployerId(employer),
        job_id: None,
        is_accepted: true,
        is_processed: false,
        created_at: time::macros::datetime!(2024-03-10 9:30),
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    transport: Arc<RecordingTransport>,
    pacer: Arc<RecordingPacer>,
    center: NotificationCenter<MemoryStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with_transport(RecordingTransport::default())
    }

    fn with_transport(transport: RecordingTransport) -> Self {
        let store = Arc::new(MemoryStore::new());
        store.insert_channel(BroadcastChannel {
            chat_id: EMPLOYER_CHANNEL,
            audience: ChannelAudience::Employers,
        });
        store.insert_channel(BroadcastChannel {
            chat_id: WORKER_CHANNEL,
            audience: ChannelAudience::Workers,
        });
        let transport = Arc::new(transport);
        let pacer = Arc::new(RecordingPacer::default());
        let center = NotificationCenter::new(
            store.clone(),
            Arc::new(StaticTemplates::echo()),
            transport.clone(),
            pacer.clone(),
            ConfigStore::new(config()),
        );
        Self {
            store,
            transport,
            pacer,
            center,
        }
    }
}

#[tokio::test]
async fn new_job_reaches_workers_at_or_below_the_offer() {
    let h = Harness::new();
    h.store.insert_employer(employer(1));
    h.store.insert_worker(worker(1, &[1, 2], 50));
    h.store.insert_worker(worker(2, &[2], 70));
    h.store.insert_worker(worker(3, &[3], 40));
    let job = job(9, 1, &[2], 60);
    h.store.insert_job(job.clone());

    let report = h.center.notify_new_job(&job).await;

    assert_eq!(report.channels.delivered, 1);
    assert_eq!(report.direct.delivered, 1);
    let direct = h.transport.sent_to(ChatId(101));
    assert_eq!(direct.len(), 1);
    assert!(direct[0].text.starts_with("*new_job_interesting*"));
    assert!(h.transport.sent_to(ChatId(102)).is_empty());
    assert!(h.transport.sent_to(ChatId(103)).is_empty());

    let channel = h.transport.sent_to(WORKER_CHANNEL);
    assert_eq!(channel.len(), 1);
    assert!(channel[0].text.starts_with("*new_job*"));
}

#[tokio::test]
async fn new_worker_is_announced_in_hebrew_with_selfie_on_channels() {
    let h = Harness::new();
    h.store.insert_employer(employer(1));
    h.store.insert_employer(employer(2));
    h.store.insert_job(job(1, 1, &[1], 60));
    h.store.insert_job(job(2, 1, &[1], 80));
    h.store.insert_job(job(3, 2, &[1], 40));
    let worker = worker(5, &[1], 50);
    h.store.insert_worker(worker.clone());

    let report = h.center.notify_new_worker(&worker).await;

    assert_eq!(report.direct.delivered, 1);
    let to_employer = h.transport.sent_to(ChatId(201));
    assert_eq!(to_employer.len(), 1, "employer with two matching jobs hears once");
    assert!(to_employer[0].text.starts_with(RTL_EMBEDDING));
    assert!(h.transport.sent_to(ChatId(202)).is_empty());

    let channel = h.transport.sent_to(EMPLOYER_CHANNEL);
    assert_eq!(channel[0].photo.as_deref(), Some("selfie-5"));
}

#[tokio::test]
async fn unapproved_worker_is_not_announced() {
    let h = Harness::new();
    h.store.insert_employer(employer(1));
    h.store.insert_job(job(1, 1, &[1], 60));
    let mut worker = worker(5, &[1], 50);
    worker.is_approved = false;

    let report = h.center.notify_new_worker(&worker).await;

    assert_eq!(report, Default::default());
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn worker_without_notifications_still_gets_a_channel_post() {
    let h = Harness::new();
    h.store.insert_employer(employer(1));
    h.store.insert_job(job(1, 1, &[1], 60));
    let mut worker = worker(5, &[1], 50);
    worker.notifications = false;

    let report = h.center.notify_new_worker(&worker).await;

    assert_eq!(report.channels.delivered, 1);
    assert_eq!(report.direct.attempted, 0);
}

#[tokio::test]
async fn failed_recipient_does_not_stop_the_rest() {
    let h = Harness::new();
    h.store.insert_employer(employer(1));
    for id in 1..=4 {
        h.store.insert_worker(worker(id, &[1], 50));
    }
    h.transport.fail_for(ChatId(102));
    let job = job(1, 1, &[1], 60);

    let report = h.center.notify_new_job(&job).await;

    assert_eq!(report.direct.attempted, 4);
    assert_eq!(report.direct.delivered, 3);
    assert_eq!(report.direct.failed, 1);
    assert_eq!(h.transport.sent_to(ChatId(104)).len(), 1);
}

#[tokio::test]
async fn pacing_waits_between_sends_only() {
    let h = Harness::new();
    h.store.insert_channel(BroadcastChannel {
        chat_id: ChatId(-2003),
        audience: ChannelAudience::Workers,
    });
    h.store.insert_employer(employer(1));
    for id in 1..=3 {
        h.store.insert_worker(worker(id, &[1], 50));
    }

    h.center.notify_new_job(&job(1, 1, &[1], 60)).await;

    let pacing = PacingConfig::default();
    assert_eq!(
        h.pacer.pauses(),
        vec![
            pacing.channel_delay,
            pacing.direct_delay,
            pacing.direct_delay
        ]
    );
}

#[tokio::test]
async fn missing_template_aborts_only_that_message() {
    let store = Arc::new(MemoryStore::new());
    store.insert_channel(BroadcastChannel {
        chat_id: WORKER_CHANNEL,
        audience: ChannelAudience::Workers,
    });
    store.insert_employer(employer(1));
    store.insert_worker(worker(1, &[1], 50));
    let mut templates = StaticTemplates::echo();
    templates.remove(TemplateKey::NewJob, Locale::Russian);
    let transport = Arc::new(RecordingTransport::default());
    let center = NotificationCenter::new(
        store,
        Arc::new(templates),
        transport.clone(),
        Arc::new(RecordingPacer::default()),
        ConfigStore::new(config()),
    );

    let report = center.notify_new_job(&job(1, 1, &[1], 60)).await;

    assert_eq!(report.channels.attempted, 0);
    assert_eq!(report.direct.delivered, 1);
    assert!(transport.sent_to(WORKER_CHANNEL).is_empty());
}

#[tokio::test]
async fn repeated_acceptance_between_a_pair_is_flagged() {
    let h = Harness::new();
    h.store.insert_worker(worker(1, &[1], 50));
    h.store.insert_employer(employer(1));
    h.store.insert_proposal(accepted(ProposalOrigin::Worker, 1, 1, 1));
    h.store.insert_proposal(accepted(ProposalOrigin::Employer, 1, 1, 1));

    let first = h.center.handle_worker_proposal_accepted(1).await.unwrap();
    let second = h.center.handle_employer_proposal_accepted(1).await.unwrap();

    assert_eq!(first, AcceptanceOutcome::Reported { is_duplicate: false });
    assert_eq!(second, AcceptanceOutcome::Reported { is_duplicate: true });
    let reports = h.transport.sent_to(PROPOSALS_CHAT);
    assert_eq!(reports.len(), 2);
    assert!(!reports[0].text.contains("duplicate_proposal"));
    assert!(reports[1].text.starts_with("❗️*duplicate_proposal*❗️\n\n"));
}

#[tokio::test]
async fn concurrent_acceptance_of_one_proposal_reports_once() {
    let h = Harness::with_transport(RecordingTransport::with_latency(Duration::from_millis(20)));
    h.store.insert_worker(worker(1, &[1], 50));
    h.store.insert_employer(employer(1));
    h.store.insert_proposal(accepted(ProposalOrigin::Worker, 7, 1, 1));

    let (a, b) = tokio::join!(
        h.center.handle_worker_proposal_accepted(7),
        h.center.handle_worker_proposal_accepted(7),
    );

    let mut outcomes = vec![a.unwrap(), b.unwrap()];
    outcomes.sort_by_key(|outcome| matches!(outcome, AcceptanceOutcome::NotPending));
    assert_eq!(
        outcomes,
        vec![
            AcceptanceOutcome::Reported { is_duplicate: false },
            AcceptanceOutcome::NotPending
        ]
    );
    assert_eq!(h.transport.sent_to(PROPOSALS_CHAT).len(), 1);
    assert!(!h.store.mark_processed(ProposalRef::worker(7)).await.unwrap());
}

#[tokio::test]
async fn reviews_go_to_the_reviews_chat_with_a_moderation_button() {
    let h = Harness::new();
    h.store.insert_worker(worker(1, &[1], 50));
    h.store.insert_employer(employer(1));
    h.store.insert_review(Review {
        origin: ReviewOrigin::ByWorker,
        id: 3,
        worker_id: WorkerId(1),
        employer_id: EmployerId(1),
        rating: 5,
        comment: Some("Paid on time".to_string()),
        created_at: time::macros::datetime!(2024-03-11 18:00),
    });

    assert!(h.center.notify_worker_review(3).await.unwrap());
    assert!(!h.center.notify_employer_review(3).await.unwrap());

    let sent = h.transport.sent_to(REVIEWS_CHAT);
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("5 ⭐️"));
    assert!(sent[0].text.contains("@company\\_1"));
    let controls = sent[0].controls.as_ref().unwrap();
    assert_eq!(
        controls.inline_keyboard[0][0].action,
        workx_sdk::objects::ButtonAction::CallbackData("worker-review:3".to_string())
    );
}

#[tokio::test]
async fn missing_entities_are_a_silent_no_op() {
    let h = Harness::new();
    h.center
        .handle(NotificationEvent::WorkerApproved {
            worker_id: WorkerId(404),
        })
        .await
        .unwrap();
    h.center
        .handle(NotificationEvent::ProposalAccepted {
            proposal: ProposalRef::employer(404),
        })
        .await
        .unwrap();
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn run_handles_queued_events_and_drains_on_shutdown() {
    let h = Harness::new();
    h.store.insert_employer(employer(1));
    h.store.insert_worker(worker(1, &[1], 50));
    h.store.insert_job(job(1, 1, &[1], 60));

    let (event_tx, event_rx) = notification_event_channel();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let running = tokio::spawn(h.center.clone().run(event_rx, shutdown_rx));

    event_tx
        .send(NotificationEvent::JobApproved { job_id: JobId(1) })
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while h.transport.sent_to(ChatId(101)).is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    shutdown_tx.send(true).unwrap();
    running.await.unwrap();
    assert_eq!(h.transport.sent_to(WORKER_CHANNEL).len(), 1);
}
