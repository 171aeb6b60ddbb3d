//! Repository trait for the analytics store.

use crate::domain::entities::{AnalyticRecord, NewAnalyticRecord};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for the access ledger.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAnalyticsRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryAnalyticsRepository`] - In-memory implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Creates the record for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if a record was created
    /// - `Ok(None)` if one already exists for the short code
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(
        &self,
        new_record: NewAnalyticRecord,
    ) -> Result<Option<AnalyticRecord>, AppError>;

    /// Atomically adds one access and stamps `last_accessed_at`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` with the updated record
    /// - `Ok(None)` if no record exists for the short code
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment_access(
        &self,
        short_code: &str,
        accessed_at: DateTime<Utc>,
    ) -> Result<Option<AnalyticRecord>, AppError>;

    /// Finds the record for a short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_short_code(
        &self,
        short_code: &str,
    ) -> Result<Option<AnalyticRecord>, AppError>;

    /// Lists records, most accessed first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<AnalyticRecord>, AppError>;

    /// Counts all records.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count(&self) -> Result<i64, AppError>;
}
