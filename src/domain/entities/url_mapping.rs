//! Url mapping entity, the source of truth for short code assignment.

use chrono::{DateTime, Utc};

/// A short code assigned to a long URL.
///
/// `id` is the ordinal reserved from the mapping store and `short_code` is its
/// base62 rendering. Mappings are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMapping {
    pub id: i64,
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
}

impl UrlMapping {
    /// Creates a new UrlMapping instance.
    pub fn new(id: i64, short_code: String, long_url: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            short_code,
            long_url,
            created_at,
        }
    }
}

/// Input data for persisting a mapping under an already reserved ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlMapping {
    pub id: i64,
    pub short_code: String,
    pub long_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_mapping_creation() {
        let now = Utc::now();
        let mapping = UrlMapping::new(
            1,
            "1".to_string(),
            "https://example.com/a".to_string(),
            now,
        );

        assert_eq!(mapping.id, 1);
        assert_eq!(mapping.short_code, "1");
        assert_eq!(mapping.long_url, "https://example.com/a");
        assert_eq!(mapping.created_at, now);
    }
}
