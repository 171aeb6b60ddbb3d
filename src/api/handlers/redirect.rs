//! Handler for short code resolution.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::redirect::{RedirectQuery, RedirectResponse};
use crate::api::handlers::request_id;
use crate::error::AppError;
use crate::state::AppState;

/// Resolves a short code to its original URL.
///
/// # Endpoint
///
/// `GET /redirect?url=<shortCode>`
///
/// # Lookup
///
/// Cache first, then the redirect store. The store result is not written back
/// to the cache. The `X-Cache` header reports `HIT` or `MISS`.
///
/// # Response
///
/// ```json
/// { "id": "4fRk2LpQx1c", "url": "1", "originalUrl": "https://example.com/a" }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the `url` parameter is missing or empty.
/// Returns 404 Not Found if the short code is unknown.
/// Returns 500 Internal Server Error if the store lookup fails.
pub async fn redirect_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RedirectQuery>,
) -> Result<Response, AppError> {
    let short_code = query
        .url
        .filter(|code| !code.is_empty())
        .ok_or_else(|| {
            AppError::bad_request("Missing short code", json!({ "param": "url" }))
        })?;

    let request_id = request_id(&headers);
    let resolution = state
        .redirect_service
        .resolve(&short_code, &request_id)
        .await?;

    let mut response = Json(RedirectResponse {
        id: request_id,
        url: short_code,
        original_url: resolution.long_url,
    })
    .into_response();

    response.headers_mut().insert(
        "x-cache",
        HeaderValue::from_static(resolution.source.as_header()),
    );

    Ok(response)
}
