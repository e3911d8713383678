use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// A localized template row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Text {
    pub slug: String,
    pub heb: String,
    pub rus: String,
}

#[derive(Debug, Clone)]
pub struct GetTextBySlug {
    pub slug: &'static str,
}

impl Processor<GetTextBySlug> for DatabaseProcessor {
    type Output = Option<Text>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetTextBySlug")]
    async fn process(&self, query: GetTextBySlug) -> Result<Option<Text>, sqlx::Error> {
        let text = sqlx::query_as::<_, Text>(
            r#"
            SELECT slug, heb, rus
            FROM texts
            WHERE slug = $1
            "#,
        )
        .bind(query.slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(text)
    }
}
