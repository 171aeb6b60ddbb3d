//! Handler for link shortening endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::handlers::request_id;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short code for a long URL.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/a" }
/// ```
///
/// # Response
///
/// ```json
/// { "id": "4fRk2LpQx1c", "url": "https://example.com/a", "shortened": "1" }
/// ```
///
/// The mapping is durable once this returns. The redirect and analytics
/// services learn about it asynchronously, so an immediate `GET /redirect`
/// may still 404.
///
/// # Errors
///
/// Returns 400 Bad Request if the body is not `{"url": "<string>"}` or the URL
/// is empty or malformed.
/// Returns 500 Internal Server Error if the mapping cannot be stored.
pub async fn shorten_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let request_id = request_id(&headers);
    let mapping = state
        .mapping_service
        .shorten(&payload.url, &request_id)
        .await?;

    Ok(Json(ShortenResponse {
        id: request_id,
        url: mapping.long_url,
        shortened: mapping.short_code,
    }))
}
