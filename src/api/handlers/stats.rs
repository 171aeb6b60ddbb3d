//! Handler for per-code access statistics.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::stats::AnalyticRecordResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the analytics record for a short code.
///
/// # Endpoint
///
/// `GET /stats/{code}`
///
/// # Response
///
/// ```json
/// {
///   "code": "1",
///   "long_url": "https://example.com/a",
///   "access_count": 3,
///   "created_at": "2026-01-01T00:00:00Z",
///   "last_accessed_at": "2026-01-02T10:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// Returns 404 Not Found if the analytics service has no record for the code.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<AnalyticRecordResponse>, AppError> {
    let record = state.analytics_service.get_record(&code).await?;
    Ok(Json(record.into()))
}
