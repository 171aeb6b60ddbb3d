//! Access ledger service.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::domain::entities::{AnalyticRecord, NewAnalyticRecord};
use crate::domain::events::{AccessKind, AccessPropagation};
use crate::domain::repositories::AnalyticsRepository;
use crate::error::AppError;

/// Applies access events to the analytics store and serves its contents.
pub struct AnalyticsService {
    repository: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsService {
    /// Creates a new analytics service.
    pub fn new(repository: Arc<dyn AnalyticsRepository>) -> Self {
        Self { repository }
    }

    /// Applies one access event.
    ///
    /// - `map` creates the record with zero accesses; a second `map` for the
    ///   same code changes nothing.
    /// - `redirect` adds one access and stamps `last_accessed_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for a `redirect` on a code with no
    /// record. The consumer requeues it, hoping the `map` event arrives first.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn on_event(&self, event: AccessPropagation) -> Result<(), AppError> {
        match event.kind {
            AccessKind::Map => {
                let created_at = event.occurred_at();
                let created = self
                    .repository
                    .create(NewAnalyticRecord {
                        short_code: event.short_code.clone(),
                        long_url: event.url,
                        created_at,
                    })
                    .await?;

                match created {
                    Some(_) => info!(short_code = %event.short_code, "Analytic record created"),
                    None => debug!(short_code = %event.short_code, "Analytic record already exists"),
                }
                Ok(())
            }
            AccessKind::Redirect => {
                let updated = self
                    .repository
                    .increment_access(&event.short_code, event.occurred_at())
                    .await?;

                match updated {
                    Some(record) => {
                        debug!(
                            short_code = %record.short_code,
                            access_count = record.access_count,
                            "Access recorded"
                        );
                        Ok(())
                    }
                    None => Err(AppError::not_found(
                        "Analytic record not found",
                        json!({ "code": event.short_code }),
                    )),
                }
            }
        }
    }

    /// Retrieves the record for a short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code has no record.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn get_record(&self, short_code: &str) -> Result<AnalyticRecord, AppError> {
        self.repository
            .find_by_short_code(short_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Statistics not found", json!({ "code": short_code }))
            })
    }

    /// Lists records, most accessed first, with the total record count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn list_records(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<AnalyticRecord>, i64), AppError> {
        let records = self.repository.list(offset, limit).await?;
        let total = self.repository.count().await?;
        Ok((records, total))
    }
}
