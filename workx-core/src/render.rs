//! Message renderer.
//!
//! Every message is assembled from localized templates plus entity
//! attributes. All templates a message needs are loaded before anything is
//! formatted, so a missing template aborts that message and nothing else.

use crate::entities::{Employer, EmploymentType, Job, Proposal, Review, Worker, ZoneSet};
use crate::store::StoreError;
use crate::utils::markdown::{escape_markdown, mention};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Write as _;
use workx_sdk::objects::{InlineButton, Payload, ReplyControls};

/// Right-to-left embedding mark put in front of Hebrew messages.
pub const RTL_EMBEDDING: char = '\u{202B}';

macro_rules! template_keys {
    ($($(#[$meta:meta])* $variant:ident => $slug:literal,)+) => {
        /// Slug of a localized template.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum TemplateKey {
            $($(#[$meta])* $variant,)+
        }

        impl TemplateKey {
            pub const ALL: &'static [TemplateKey] = &[$(TemplateKey::$variant,)+];

            pub fn slug(self) -> &'static str {
                match self {
                    $(TemplateKey::$variant => $slug,)+
                }
            }
        }
    };
}

template_keys! {
    /// Heading of a new worker broadcast.
    NewWorker => "new_worker",
    /// Heading of a new worker sent to an interested employer.
    NewWorkerInteresting => "new_worker_interesting",
    NewJob => "new_job",
    NewJobInteresting => "new_job_interesting",
    Zones => "zones",
    MinSalary => "min_salary",
    SalaryHourly => "salary_hourly",
    WorkType => "work_type",
    WorkTypePermanent => "work_type_permanent",
    WorkTypeTemporary => "work_type_temporary",
    About => "about",
    Description => "description",
    NotSpecified => "not_specified",
    /// Deep-link button under channel posts about workers.
    MoreWorkers => "more_workers",
    MoreJobs => "more_jobs",
    WorkerDetails => "worker_details",
    JobDetails => "job_details",
    WorkerProposalAccepted => "worker_proposal_accepted",
    EmployerProposalAccepted => "employer_proposal_accepted",
    DuplicateProposal => "duplicate_proposal",
    EmployerReview => "employer_review",
    WorkerReview => "worker_review",
    SectionWorker => "section_worker",
    SectionEmployer => "section_employer",
    SectionJob => "section_job",
    SectionReview => "section_review",
    TelegramId => "telegram_id",
    Name => "name",
    CompanyName => "company_name",
    Username => "username",
    Phone => "phone",
    Rating => "rating",
    Comment => "comment",
    Moderate => "moderate",
}

impl std::fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[serde(alias = "he")]
    Hebrew,
    #[serde(alias = "ru")]
    Russian,
}

impl Locale {
    /// Add the script direction prefix the locale needs.
    fn decorate(self, text: String) -> String {
        match self {
            Locale::Hebrew => format!("{RTL_EMBEDDING}{text}"),
            Locale::Russian => text,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template `{key}` has no {locale:?} text")]
    MissingTemplate { key: TemplateKey, locale: Locale },
    #[error("failed to load templates: {0}")]
    Store(#[from] StoreError),
}

/// Source of localized template text.
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    async fn get(&self, key: TemplateKey, locale: Locale) -> Result<Option<String>, StoreError>;
}

/// Templates loaded for one message.
struct Templates {
    texts: HashMap<TemplateKey, String>,
}

impl Templates {
    async fn load(
        provider: &dyn TemplateProvider,
        locale: Locale,
        keys: &[TemplateKey],
    ) -> Result<Self, RenderError> {
        let mut texts = HashMap::with_capacity(keys.len());
        for &key in keys {
            let text = provider
                .get(key, locale)
                .await?
                .ok_or(RenderError::MissingTemplate { key, locale })?;
            texts.insert(key, text);
        }
        Ok(Self { texts })
    }

    fn get(&self, key: TemplateKey) -> &str {
        self.texts.get(&key).map(String::as_str).unwrap_or_default()
    }

    fn work_type(&self, employment_type: EmploymentType) -> &str {
        match employment_type {
            EmploymentType::Permanent => self.get(TemplateKey::WorkTypePermanent),
            EmploymentType::Temporary => self.get(TemplateKey::WorkTypeTemporary),
        }
    }

    fn field(&self, out: &mut String, key: TemplateKey, value: impl std::fmt::Display) {
        let _ = write!(out, "\n*{}* {}", self.get(key), value);
    }

    fn salary(&self, amount: i32) -> String {
        format!("{amount} {}", self.get(TemplateKey::SalaryHourly))
    }

    fn zones(zones: &ZoneSet) -> String {
        zones.labels()
    }
}

/// Which variant of an announcement to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience<'a> {
    /// A channel post with a deep link to the bot.
    Channel { bot_username: &'a str },
    /// A direct message to one interested counterparty.
    Direct,
}

const ANNOUNCEMENT_KEYS: &[TemplateKey] = &[
    TemplateKey::Zones,
    TemplateKey::MinSalary,
    TemplateKey::SalaryHourly,
    TemplateKey::WorkType,
    TemplateKey::WorkTypePermanent,
    TemplateKey::WorkTypeTemporary,
];

const PERSON_KEYS: &[TemplateKey] = &[
    TemplateKey::SectionWorker,
    TemplateKey::SectionEmployer,
    TemplateKey::TelegramId,
    TemplateKey::Name,
    TemplateKey::CompanyName,
    TemplateKey::Username,
    TemplateKey::Phone,
    TemplateKey::NotSpecified,
];

/// Accepted proposal with the entities it refers to.
#[derive(Debug, Clone)]
pub struct ProposalReport<'a> {
    pub proposal: &'a Proposal,
    pub worker: &'a Worker,
    pub employer: &'a Employer,
    pub job: Option<&'a Job>,
    /// The pair already had an accepted and processed proposal.
    pub is_duplicate: bool,
}

pub struct MessageRenderer<'p> {
    provider: &'p dyn TemplateProvider,
}

impl<'p> MessageRenderer<'p> {
    pub fn new(provider: &'p dyn TemplateProvider) -> Self {
        Self { provider }
    }

    async fn load(
        &self,
        locale: Locale,
        groups: &[&[TemplateKey]],
    ) -> Result<Templates, RenderError> {
        let keys: Vec<TemplateKey> = groups.iter().flat_map(|group| group.iter().copied()).collect();
        Templates::load(self.provider, locale, &keys).await
    }

    /// A new worker, as shown to employers.
    pub async fn new_worker(
        &self,
        worker: &Worker,
        audience: Audience<'_>,
        locale: Locale,
    ) -> Result<Payload, RenderError> {
        let (heading, button) = match audience {
            Audience::Channel { .. } => (TemplateKey::NewWorker, TemplateKey::MoreWorkers),
            Audience::Direct => (TemplateKey::NewWorkerInteresting, TemplateKey::WorkerDetails),
        };
        let t = self
            .load(locale, &[ANNOUNCEMENT_KEYS, &[heading, button, TemplateKey::About]])
            .await?;

        let mut text = format!("*{}*\n", t.get(heading));
        t.field(&mut text, TemplateKey::Zones, Templates::zones(&worker.zones));
        t.field(&mut text, TemplateKey::MinSalary, t.salary(worker.min_salary));
        t.field(&mut text, TemplateKey::WorkType, t.work_type(worker.employment_type));
        t.field(&mut text, TemplateKey::About, escape_markdown(&worker.about));

        let (button, photo) = match audience {
            Audience::Channel { bot_username } => (
                InlineButton::url(t.get(button), deep_link(bot_username, "more-workers")),
                worker.selfie.clone(),
            ),
            Audience::Direct => (
                InlineButton::callback(t.get(button), format!("workers-suitable:{}", worker.id)),
                None,
            ),
        };
        Ok(Payload::text(locale.decorate(text))
            .with_photo(photo)
            .with_controls(Some(ReplyControls::single(button))))
    }

    /// A new job, as shown to workers.
    pub async fn new_job(
        &self,
        job: &Job,
        audience: Audience<'_>,
        locale: Locale,
    ) -> Result<Payload, RenderError> {
        let (heading, button) = match audience {
            Audience::Channel { .. } => (TemplateKey::NewJob, TemplateKey::MoreJobs),
            Audience::Direct => (TemplateKey::NewJobInteresting, TemplateKey::JobDetails),
        };
        let t = self
            .load(
                locale,
                &[ANNOUNCEMENT_KEYS, &[heading, button, TemplateKey::Description]],
            )
            .await?;

        let mut text = format!("*{}*\n", t.get(heading));
        t.field(&mut text, TemplateKey::Zones, Templates::zones(&job.zones));
        t.field(&mut text, TemplateKey::MinSalary, t.salary(job.min_salary));
        t.field(&mut text, TemplateKey::WorkType, t.work_type(job.employment_type));
        t.field(
            &mut text,
            TemplateKey::Description,
            escape_markdown(&job.description),
        );

        let button = match audience {
            Audience::Channel { bot_username } => {
                InlineButton::url(t.get(button), deep_link(bot_username, "more-jobs"))
            }
            Audience::Direct => {
                InlineButton::callback(t.get(button), format!("suitable-jobs:{}", job.id))
            }
        };
        Ok(Payload::text(locale.decorate(text)).with_controls(Some(ReplyControls::single(button))))
    }

    /// Admin report about an accepted proposal. A duplicate report opens
    /// with a warning banner.
    pub async fn proposal_report(
        &self,
        report: &ProposalReport<'_>,
        locale: Locale,
    ) -> Result<Payload, RenderError> {
        let heading = match report.proposal.origin {
            crate::entities::ProposalOrigin::Worker => TemplateKey::WorkerProposalAccepted,
            crate::entities::ProposalOrigin::Employer => TemplateKey::EmployerProposalAccepted,
        };
        let banner: &[TemplateKey] = if report.is_duplicate {
            &[TemplateKey::DuplicateProposal]
        } else {
            &[]
        };
        let t = self
            .load(
                locale,
                &[
                    ANNOUNCEMENT_KEYS,
                    PERSON_KEYS,
                    banner,
                    &[heading, TemplateKey::SectionJob],
                ],
            )
            .await?;

        let mut text = String::new();
        if report.is_duplicate {
            let _ = write!(text, "❗️*{}*❗️\n\n", t.get(TemplateKey::DuplicateProposal));
        }
        let _ = writeln!(text, "*{}*", t.get(heading));
        write_worker_section(&t, &mut text, report.worker, true);
        write_employer_section(&t, &mut text, report.employer);
        if let Some(job) = report.job {
            let _ = write!(text, "\n\n*{}*", t.get(TemplateKey::SectionJob));
            t.field(&mut text, TemplateKey::Zones, Templates::zones(&job.zones));
            t.field(&mut text, TemplateKey::MinSalary, t.salary(job.min_salary));
            t.field(&mut text, TemplateKey::WorkType, t.work_type(job.employment_type));
        }
        Ok(Payload::text(locale.decorate(text)))
    }

    /// Admin report about a new review, with a moderation button.
    pub async fn review_report(
        &self,
        review: &Review,
        worker: &Worker,
        employer: &Employer,
        locale: Locale,
    ) -> Result<Payload, RenderError> {
        let heading = match review.origin {
            crate::entities::ReviewOrigin::ByEmployer => TemplateKey::EmployerReview,
            crate::entities::ReviewOrigin::ByWorker => TemplateKey::WorkerReview,
        };
        let t = self
            .load(
                locale,
                &[
                    PERSON_KEYS,
                    &[
                        heading,
                        TemplateKey::SectionReview,
                        TemplateKey::Rating,
                        TemplateKey::Comment,
                        TemplateKey::Moderate,
                    ],
                ],
            )
            .await?;

        let mut text = format!("*{}*\n", t.get(heading));
        match review.origin {
            crate::entities::ReviewOrigin::ByEmployer => {
                write_employer_section(&t, &mut text, employer);
                write_worker_section(&t, &mut text, worker, false);
            }
            crate::entities::ReviewOrigin::ByWorker => {
                write_worker_section(&t, &mut text, worker, false);
                write_employer_section(&t, &mut text, employer);
            }
        }
        let comment = review
            .comment
            .as_deref()
            .filter(|comment| !comment.is_empty())
            .map(escape_markdown)
            .unwrap_or_else(|| t.get(TemplateKey::NotSpecified).to_string());
        let _ = write!(text, "\n\n*{}*", t.get(TemplateKey::SectionReview));
        t.field(&mut text, TemplateKey::Rating, format!("{} ⭐️", review.rating));
        t.field(&mut text, TemplateKey::Comment, comment);

        let button = InlineButton::callback(
            t.get(TemplateKey::Moderate),
            format!("{}:{}", review.origin.callback_prefix(), review.id),
        );
        Ok(Payload::text(locale.decorate(text)).with_controls(Some(ReplyControls::single(button))))
    }
}

fn write_worker_section(t: &Templates, out: &mut String, worker: &Worker, with_terms: bool) {
    let _ = write!(out, "\n\n*{}*", t.get(TemplateKey::SectionWorker));
    t.field(out, TemplateKey::TelegramId, worker.chat_id);
    t.field(out, TemplateKey::Name, escape_markdown(&worker.name));
    t.field(
        out,
        TemplateKey::Username,
        mention(worker.username.as_deref(), t.get(TemplateKey::NotSpecified)),
    );
    t.field(out, TemplateKey::Phone, escape_markdown(&worker.phone));
    if with_terms {
        t.field(out, TemplateKey::Zones, Templates::zones(&worker.zones));
        t.field(out, TemplateKey::WorkType, t.work_type(worker.employment_type));
        t.field(out, TemplateKey::MinSalary, t.salary(worker.min_salary));
    }
}

fn write_employer_section(t: &Templates, out: &mut String, employer: &Employer) {
    let _ = write!(out, "\n\n*{}*", t.get(TemplateKey::SectionEmployer));
    t.field(out, TemplateKey::TelegramId, employer.chat_id);
    t.field(out, TemplateKey::CompanyName, escape_markdown(&employer.name));
    t.field(
        out,
        TemplateKey::Username,
        mention(employer.username.as_deref(), t.get(TemplateKey::NotSpecified)),
    );
    t.field(out, TemplateKey::Phone, escape_markdown(&employer.phone));
}

fn deep_link(bot_username: &str, start: &str) -> String {
    format!("https://t.me/{bot_username}?start={start}")
}
