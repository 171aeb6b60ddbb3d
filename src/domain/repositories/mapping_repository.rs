//! Repository trait for the mapping store.

use crate::domain::entities::{NewUrlMapping, UrlMapping};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for short code assignment.
///
/// The mapping store is the source of truth: a mapping exists once
/// [`MappingRepository::create`] returns, whatever happens downstream.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgMappingRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryMappingRepository`] - In-memory implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MappingRepository: Send + Sync {
    /// Reserves the next ordinal from the store's sequence.
    ///
    /// Concurrent callers always receive distinct values. The first value is 1.
    /// A reserved ordinal that is never used leaves a gap.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn reserve_ordinal(&self) -> Result<i64, AppError>;

    /// Persists a mapping under a reserved ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the ordinal or short code is taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_mapping: NewUrlMapping) -> Result<UrlMapping, AppError>;

    /// Finds a mapping by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<UrlMapping>, AppError>;

    /// Counts all mappings.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count(&self) -> Result<i64, AppError>;
}
