//! PostgreSQL implementation of the redirect repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewRedirectRecord, RedirectRecord};
use crate::domain::repositories::RedirectRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct RedirectRow {
    id: i64,
    short_code: String,
    long_url: String,
    created_at: DateTime<Utc>,
}

impl From<RedirectRow> for RedirectRecord {
    fn from(row: RedirectRow) -> Self {
        RedirectRecord {
            id: row.id,
            short_code: row.short_code,
            long_url: row.long_url,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL repository backing cache misses on resolve.
pub struct PgRedirectRepository {
    pool: Arc<PgPool>,
}

impl PgRedirectRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RedirectRepository for PgRedirectRepository {
    async fn create(&self, new_record: NewRedirectRecord) -> Result<RedirectRecord, AppError> {
        let row = sqlx::query_as::<_, RedirectRow>(
            r#"
            INSERT INTO redirect_records (short_code, long_url)
            VALUES ($1, $2)
            RETURNING id, short_code, long_url, created_at
            "#,
        )
        .bind(&new_record.short_code)
        .bind(&new_record.long_url)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_short_code(
        &self,
        short_code: &str,
    ) -> Result<Option<RedirectRecord>, AppError> {
        let row = sqlx::query_as::<_, RedirectRow>(
            r#"
            SELECT id, short_code, long_url, created_at
            FROM redirect_records
            WHERE short_code = $1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn count_by_short_code(&self, short_code: &str) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM redirect_records WHERE short_code = $1")
                .bind(short_code)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }
}
