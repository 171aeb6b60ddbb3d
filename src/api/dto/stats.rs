//! DTOs for analytics records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::AnalyticRecord;

/// Access statistics for one short code.
#[derive(Debug, Serialize)]
pub struct AnalyticRecordResponse {
    pub code: String,
    pub long_url: String,
    pub access_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl From<AnalyticRecord> for AnalyticRecordResponse {
    fn from(record: AnalyticRecord) -> Self {
        Self {
            code: record.short_code,
            long_url: record.long_url,
            access_count: record.access_count,
            created_at: record.created_at,
            last_accessed_at: record.last_accessed_at,
        }
    }
}

/// Paginated list of analytics records.
#[derive(Debug, Serialize)]
pub struct StatsListResponse {
    pub pagination: PaginationMeta,
    pub items: Vec<AnalyticRecordResponse>,
}

/// Pagination metadata for responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}
