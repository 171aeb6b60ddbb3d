//! Redirect record entity mirrored from accepted propagation events.

use chrono::{DateTime, Utc};

/// A durable short code to long URL row owned by the redirect service.
///
/// Derived from a [`crate::domain::entities::UrlMapping`] but stored in its own
/// table and only eventually consistent with it. There is no uniqueness
/// constraint on `short_code`: a redelivered propagation event inserts a
/// second row, and lookups read the newest one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRecord {
    pub id: i64,
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
}

/// Input data for inserting a redirect record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRedirectRecord {
    pub short_code: String,
    pub long_url: String,
}
