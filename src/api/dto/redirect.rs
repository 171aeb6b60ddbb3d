//! DTOs for the redirect lookup endpoint.

use serde::{Deserialize, Serialize};

/// Query string of `GET /redirect`.
///
/// The parameter is called `url` but carries the short code.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub url: Option<String>,
}

/// Resolved mapping.
#[derive(Debug, Serialize, Deserialize)]
pub struct RedirectResponse {
    /// Request id.
    pub id: String,
    /// Short code that was looked up.
    pub url: String,
    #[serde(rename = "originalUrl")]
    pub original_url: String,
}
