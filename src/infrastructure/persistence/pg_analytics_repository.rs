//! PostgreSQL implementation of the analytics repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{AnalyticRecord, NewAnalyticRecord};
use crate::domain::repositories::AnalyticsRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct AnalyticRow {
    id: i64,
    short_code: String,
    long_url: String,
    access_count: i64,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
}

impl From<AnalyticRow> for AnalyticRecord {
    fn from(row: AnalyticRow) -> Self {
        AnalyticRecord {
            id: row.id,
            short_code: row.short_code,
            long_url: row.long_url,
            access_count: row.access_count,
            created_at: row.created_at,
            last_accessed_at: row.last_accessed_at,
        }
    }
}

/// PostgreSQL repository for the access ledger.
///
/// Increments happen in a single `UPDATE ... RETURNING`, so concurrent
/// workers never lose an access.
pub struct PgAnalyticsRepository {
    pool: Arc<PgPool>,
}

impl PgAnalyticsRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for PgAnalyticsRepository {
    async fn create(
        &self,
        new_record: NewAnalyticRecord,
    ) -> Result<Option<AnalyticRecord>, AppError> {
        let row = sqlx::query_as::<_, AnalyticRow>(
            r#"
            INSERT INTO analytic_records (short_code, long_url, access_count, created_at, last_accessed_at)
            VALUES ($1, $2, 0, $3, $3)
            ON CONFLICT (short_code) DO NOTHING
            RETURNING id, short_code, long_url, access_count, created_at, last_accessed_at
            "#,
        )
        .bind(&new_record.short_code)
        .bind(&new_record.long_url)
        .bind(new_record.created_at)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn increment_access(
        &self,
        short_code: &str,
        accessed_at: DateTime<Utc>,
    ) -> Result<Option<AnalyticRecord>, AppError> {
        let row = sqlx::query_as::<_, AnalyticRow>(
            r#"
            UPDATE analytic_records
            SET access_count = access_count + 1,
                last_accessed_at = GREATEST(last_accessed_at, $2)
            WHERE short_code = $1
            RETURNING id, short_code, long_url, access_count, created_at, last_accessed_at
            "#,
        )
        .bind(short_code)
        .bind(accessed_at)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_short_code(
        &self,
        short_code: &str,
    ) -> Result<Option<AnalyticRecord>, AppError> {
        let row = sqlx::query_as::<_, AnalyticRow>(
            r#"
            SELECT id, short_code, long_url, access_count, created_at, last_accessed_at
            FROM analytic_records
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<AnalyticRecord>, AppError> {
        let rows = sqlx::query_as::<_, AnalyticRow>(
            r#"
            SELECT id, short_code, long_url, access_count, created_at, last_accessed_at
            FROM analytic_records
            ORDER BY access_count DESC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analytic_records")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
