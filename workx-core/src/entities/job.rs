use crate::entities::{EmployerId, EmploymentType, JobId, ZoneSet};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// A job listing owned by an employer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub employer_id: EmployerId,
    pub zones: ZoneSet,
    /// Minimum offered hourly salary.
    pub min_salary: i32,
    pub employment_type: EmploymentType,
    pub description: String,
    pub is_approved: bool,
    pub is_active: bool,
    pub notifications: bool,
}

impl Job {
    /// Approved, active and accepting notifications.
    pub fn is_eligible(&self) -> bool {
        self.is_approved && self.is_active && self.notifications
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct JobRow {
    id: i64,
    employer_id: i64,
    zones: Vec<i16>,
    min_salary: i32,
    permanent_work: bool,
    description: String,
    is_approved: bool,
    is_active: bool,
    notifications: bool,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Self {
            id: JobId(row.id),
            employer_id: EmployerId(row.employer_id),
            zones: ZoneSet::from_column(row.zones),
            min_salary: row.min_salary,
            employment_type: EmploymentType::from_permanent_flag(row.permanent_work),
            description: row.description,
            is_approved: row.is_approved,
            is_active: row.is_active,
            notifications: row.notifications,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetJobById {
    pub job_id: JobId,
}

impl Processor<GetJobById> for DatabaseProcessor {
    type Output = Option<Job>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetJobById")]
    async fn process(&self, query: GetJobById) -> Result<Option<Job>, sqlx::Error> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT
                id, employer_id, zones, min_salary, permanent_work, description,
                is_approved, is_active, notifications
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(query.job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Job::from))
    }
}
