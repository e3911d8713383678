use crate::entities::ChatId;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// Who reads a broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "channel_audience")]
pub enum ChannelAudience {
    /// Receives new worker profiles.
    Employers,
    /// Receives new job listings.
    Workers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastChannel {
    pub chat_id: ChatId,
    pub audience: ChannelAudience,
}

#[derive(Debug, Clone)]
pub struct GetChannels {
    pub audience: ChannelAudience,
}

impl Processor<GetChannels> for DatabaseProcessor {
    type Output = Vec<BroadcastChannel>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetChannels")]
    async fn process(&self, query: GetChannels) -> Result<Vec<BroadcastChannel>, sqlx::Error> {
        let chat_ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT tg_id
            FROM broadcast_channels
            WHERE audience = $1
            ORDER BY id
            "#,
        )
        .bind(query.audience)
        .fetch_all(&self.pool)
        .await?;
        Ok(chat_ids
            .into_iter()
            .map(|chat_id| BroadcastChannel {
                chat_id: ChatId(chat_id),
                audience: query.audience,
            })
            .collect())
    }
}
