//! PostgreSQL backend; schema applied from embedded migrations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use svitlo_core::{ChatId, RenderedSchedule, ScheduleRecord, Subscriber};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::traits::{ScheduleStore, SubscriptionRegistry};

/// Fixed primary key of the single schedule row.
const SCHEDULE_ROW_ID: i16 = 1;

/// Serves both the schedule slot and the subscriber table from one pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        if database_url.is_empty() {
            return Err(StoreError::NotConfigured("DATABASE_URL is empty".to_string()));
        }
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("PostgreSQL connected");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;
        info!("Database migrations applied successfully");

        Ok(Self { pool })
    }
}

#[async_trait]
impl ScheduleStore for PgStore {
    async fn get(&self) -> Result<Option<ScheduleRecord>> {
        let row = sqlx::query_as::<_, (String, DateTime<Utc>)>(
            "SELECT content, last_updated FROM schedule_record WHERE id = $1",
        )
        .bind(SCHEDULE_ROW_ID)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(content, last_updated)| {
            ScheduleRecord::new(RenderedSchedule::from_stored(content), last_updated)
        }))
    }

    async fn put(&self, record: &ScheduleRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO schedule_record (id, content, last_updated) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET content = EXCLUDED.content, last_updated = EXCLUDED.last_updated",
        )
        .bind(SCHEDULE_ROW_ID)
        .bind(record.content.as_str())
        .bind(record.last_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "postgres"
    }
}

#[async_trait]
impl SubscriptionRegistry for PgStore {
    async fn list(&self) -> Result<Vec<Subscriber>> {
        let rows = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "SELECT chat_id, joined_at FROM subscribers ORDER BY joined_at, chat_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(chat_id, joined_at)| Subscriber::new(ChatId(chat_id), joined_at))
            .collect())
    }

    async fn exists(&self, chat_id: ChatId) -> Result<bool> {
        let found: Option<(i64,)> =
            sqlx::query_as("SELECT chat_id FROM subscribers WHERE chat_id = $1")
                .bind(chat_id.0)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn add(&self, subscriber: Subscriber) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO subscribers (chat_id, joined_at) VALUES ($1, $2) ON CONFLICT (chat_id) DO NOTHING",
        )
        .bind(subscriber.chat_id.0)
        .bind(subscriber.joined_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, chat_id: ChatId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscribers WHERE chat_id = $1")
            .bind(chat_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscribers")
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}
