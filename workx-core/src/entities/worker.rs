use crate::entities::{ChatId, EmploymentType, Job, WorkerId, ZoneSet};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// A worker profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    pub id: WorkerId,
    pub chat_id: ChatId,
    pub name: String,
    pub username: Option<String>,
    pub phone: String,
    /// Telegram `file_id` of the selfie taken during registration.
    pub selfie: Option<String>,
    pub zones: ZoneSet,
    /// Minimum acceptable hourly salary.
    pub min_salary: i32,
    pub employment_type: EmploymentType,
    pub about: String,
    pub is_approved: bool,
    pub is_searching: bool,
    pub notifications: bool,
}

impl Worker {
    /// Approved, searching and accepting notifications.
    pub fn is_eligible(&self) -> bool {
        self.is_approved && self.is_searching && self.notifications
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct WorkerRow {
    id: i64,
    tg_id: i64,
    name: String,
    username: Option<String>,
    phone: String,
    selfie: Option<String>,
    zones: Vec<i16>,
    min_salary: i32,
    permanent_work: bool,
    about: String,
    is_approved: bool,
    is_searching: bool,
    notifications: bool,
}

impl From<WorkerRow> for Worker {
    fn from(row: WorkerRow) -> Self {
        Self {
            id: WorkerId(row.id),
            chat_id: ChatId(row.tg_id),
            name: row.name,
            username: row.username,
            phone: row.phone,
            selfie: row.selfie,
            zones: ZoneSet::from_column(row.zones),
            min_salary: row.min_salary,
            employment_type: EmploymentType::from_permanent_flag(row.permanent_work),
            about: row.about,
            is_approved: row.is_approved,
            is_searching: row.is_searching,
            notifications: row.notifications,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetWorkerById {
    pub worker_id: WorkerId,
}

impl Processor<GetWorkerById> for DatabaseProcessor {
    type Output = Option<Worker>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetWorkerById")]
    async fn process(&self, query: GetWorkerById) -> Result<Option<Worker>, sqlx::Error> {
        let row = sqlx::query_as::<_, WorkerRow>(
            r#"
            SELECT
                id, tg_id, name, username, phone, selfie, zones, min_salary,
                permanent_work, about, is_approved, is_searching, notifications
            FROM workers
            WHERE id = $1
            "#,
        )
        .bind(query.worker_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Worker::from))
    }
}

#[derive(Debug, Clone)]
/// Workers that a job should be announced to.
///
/// Same predicate as [`crate::matching::is_match`], evaluated in SQL: shared
/// zone, worker's minimum at or below the offer, same employment type, and
/// the worker approved, searching and accepting notifications.
pub struct GetInterestedWorkers {
    pub zones: Vec<i16>,
    pub offered_salary: i32,
    pub permanent_work: bool,
}

impl GetInterestedWorkers {
    pub fn for_job(job: &Job) -> Self {
        Self {
            zones: job.zones.to_column(),
            offered_salary: job.min_salary,
            permanent_work: job.employment_type.is_permanent(),
        }
    }
}

const INTERESTED_WORKERS_SQL: &str = r#"
    SELECT
        id, tg_id, name, username, phone, selfie, zones, min_salary,
        permanent_work, about, is_approved, is_searching, notifications
    FROM workers
    WHERE zones && $1
      AND min_salary <= $2
      AND permanent_work = $3
      AND notifications
      AND is_approved
      AND is_searching
    ORDER BY id
"#;

impl Processor<GetInterestedWorkers> for DatabaseProcessor {
    type Output = Vec<Worker>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetInterestedWorkers")]
    async fn process(&self, query: GetInterestedWorkers) -> Result<Vec<Worker>, sqlx::Error> {
        let rows = sqlx::query_as::<_, WorkerRow>(INTERESTED_WORKERS_SQL)
            .bind(query.zones)
            .bind(query.offered_salary)
            .bind(query.permanent_work)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Worker::from).collect())
    }
}
