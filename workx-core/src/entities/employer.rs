use crate::entities::{ChatId, EmployerId, Worker};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// An employer account. Owns zero or more jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employer {
    pub id: EmployerId,
    pub chat_id: ChatId,
    /// Company name.
    pub name: String,
    pub username: Option<String>,
    pub phone: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct EmployerRow {
    id: i64,
    tg_id: i64,
    name: String,
    username: Option<String>,
    phone: String,
}

impl From<EmployerRow> for Employer {
    fn from(row: EmployerRow) -> Self {
        Self {
            id: EmployerId(row.id),
            chat_id: ChatId(row.tg_id),
            name: row.name,
            username: row.username,
            phone: row.phone,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetEmployerById {
    pub employer_id: EmployerId,
}

impl Processor<GetEmployerById> for DatabaseProcessor {
    type Output = Option<Employer>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetEmployerById")]
    async fn process(&self, query: GetEmployerById) -> Result<Option<Employer>, sqlx::Error> {
        let row = sqlx::query_as::<_, EmployerRow>(
            r#"
            SELECT id, tg_id, name, username, phone
            FROM employers
            WHERE id = $1
            "#,
        )
        .bind(query.employer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Employer::from))
    }
}

#[derive(Debug, Clone)]
/// Employers owning at least one job a worker would match.
///
/// Mirror image of [`super::worker::GetInterestedWorkers`]: the job's offer
/// must be at or above the worker's minimum, and the job must be approved,
/// active and accepting notifications. Each employer is returned once.
pub struct GetInterestedEmployers {
    pub zones: Vec<i16>,
    pub asked_salary: i32,
    pub permanent_work: bool,
}

impl GetInterestedEmployers {
    pub fn for_worker(worker: &Worker) -> Self {
        Self {
            zones: worker.zones.to_column(),
            asked_salary: worker.min_salary,
            permanent_work: worker.employment_type.is_permanent(),
        }
    }
}

const INTERESTED_EMPLOYERS_SQL: &str = r#"
    SELECT e.id, e.tg_id, e.name, e.username, e.phone
    FROM employers e
    WHERE EXISTS (
        SELECT 1
        FROM jobs j
        WHERE j.employer_id = e.id
          AND j.zones && $1
          AND j.min_salary >= $2
          AND j.permanent_work = $3
          AND j.notifications
          AND j.is_approved
          AND j.is_active
    )
    ORDER BY e.id
"#;

impl Processor<GetInterestedEmployers> for DatabaseProcessor {
    type Output = Vec<Employer>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetInterestedEmployers")]
    async fn process(&self, query: GetInterestedEmployers) -> Result<Vec<Employer>, sqlx::Error> {
        let rows = sqlx::query_as::<_, EmployerRow>(INTERESTED_EMPLOYERS_SQL)
            .bind(query.zones)
            .bind(query.asked_salary)
            .bind(query.permanent_work)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Employer::from).collect())
    }
}
