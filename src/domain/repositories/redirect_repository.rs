//! Repository trait for the redirect store.

use crate::domain::entities::{NewRedirectRecord, RedirectRecord};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the durable copy of accepted mappings.
///
/// Used as the fallback when the redirect cache misses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedirectRepository: Send + Sync {
    /// Inserts a redirect record.
    ///
    /// Always inserts a new row; duplicates for the same short code are kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_record: NewRedirectRecord) -> Result<RedirectRecord, AppError>;

    /// Finds the newest record for a short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_short_code(
        &self,
        short_code: &str,
    ) -> Result<Option<RedirectRecord>, AppError>;

    /// Counts rows stored for a short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_by_short_code(&self, short_code: &str) -> Result<i64, AppError>;
}
