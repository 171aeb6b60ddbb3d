//! Event envelopes carried on the message bus.
//!
//! Field names match the wire format shared by every service:
//!
//! ```json
//! // redirect propagation queue
//! { "id": "req-id", "url": "https://example.com/a", "shorten": "1" }
//!
//! // analytics queue
//! { "id": "req-id", "url": "https://example.com/a", "shorten": "1",
//!   "type": "redirect", "timestamp": 1700000000 }
//! ```
//!
//! Both events are delivered at least once, so consumers see duplicates.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tells the redirect service to replicate a freshly created mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPropagation {
    /// Id of the request that created the mapping.
    pub id: String,
    /// Long URL.
    pub url: String,
    /// Short code.
    #[serde(rename = "shorten")]
    pub short_code: String,
}

/// Which operation an [`AccessPropagation`] attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    Map,
    Redirect,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map => f.write_str("map"),
            Self::Redirect => f.write_str("redirect"),
        }
    }
}

/// Analytics event emitted for every map and every successful redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPropagation {
    pub id: String,
    pub url: String,
    #[serde(rename = "shorten")]
    pub short_code: String,
    #[serde(rename = "type")]
    pub kind: AccessKind,
    /// Unix seconds.
    pub timestamp: i64,
}

impl AccessPropagation {
    pub fn map(id: impl Into<String>, url: impl Into<String>, short_code: impl Into<String>) -> Self {
        Self::at(AccessKind::Map, id, url, short_code, Utc::now())
    }

    pub fn redirect(
        id: impl Into<String>,
        url: impl Into<String>,
        short_code: impl Into<String>,
    ) -> Self {
        Self::at(AccessKind::Redirect, id, url, short_code, Utc::now())
    }

    fn at(
        kind: AccessKind,
        id: impl Into<String>,
        url: impl Into<String>,
        short_code: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            short_code: short_code.into(),
            kind,
            timestamp: now.timestamp(),
        }
    }

    /// Event time, falling back to now for out-of-range timestamps.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.timestamp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}
