use crate::entities::{EmployerId, WorkerId};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewOrigin {
    /// An employer rated a worker.
    ByEmployer,
    /// A worker rated an employer.
    ByWorker,
}

impl ReviewOrigin {
    fn table(self) -> &'static str {
        match self {
            ReviewOrigin::ByEmployer => "employer_reviews",
            ReviewOrigin::ByWorker => "worker_reviews",
        }
    }

    /// Prefix of the moderation button's callback data.
    pub fn callback_prefix(self) -> &'static str {
        match self {
            ReviewOrigin::ByEmployer => "employer-review",
            ReviewOrigin::ByWorker => "worker-review",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReviewRef {
    pub origin: ReviewOrigin,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub origin: ReviewOrigin,
    pub id: i64,
    pub worker_id: WorkerId,
    pub employer_id: EmployerId,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    worker_id: i64,
    employer_id: i64,
    rating: i16,
    comment: Option<String>,
    created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone)]
pub struct GetReview {
    pub review: ReviewRef,
}

impl Processor<GetReview> for DatabaseProcessor {
    type Output = Option<Review>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetReview")]
    async fn process(&self, query: GetReview) -> Result<Option<Review>, sqlx::Error> {
        let origin = query.review.origin;
        let sql = format!(
            r#"
            SELECT id, worker_id, employer_id, rating, comment, created_at
            FROM {}
            WHERE id = $1
            "#,
            origin.table()
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(query.review.id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| Review {
            origin,
            id: row.id,
            worker_id: WorkerId(row.worker_id),
            employer_id: EmployerId(row.employer_id),
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }))
    }
}
