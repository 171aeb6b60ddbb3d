//! Analytic record entity, the access ledger for one short code.

use chrono::{DateTime, Utc};

/// Access statistics for a short code.
///
/// Created with `access_count = 0` when the `map` event arrives and bumped on
/// every `redirect` event. At most one record exists per short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticRecord {
    pub id: i64,
    pub short_code: String,
    pub long_url: String,
    pub access_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl AnalyticRecord {
    /// Returns true if the short code has never been resolved.
    pub fn is_unvisited(&self) -> bool {
        self.access_count == 0
    }
}

/// Input data for creating an analytic record from a `map` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnalyticRecord {
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
}
