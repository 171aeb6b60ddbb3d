//! DTOs for the shorten endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten a URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The original URL to shorten (must be a valid absolute URL).
    #[validate(length(min = 1, max = 2048), url(message = "Invalid URL format"))]
    pub url: String,
}

/// Response for a created mapping.
///
/// `id` is the request id that also tags the events the mapping produced.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub id: String,
    pub url: String,
    pub shortened: String,
}
