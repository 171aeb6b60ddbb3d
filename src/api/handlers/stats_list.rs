//! Handler for the analytics record listing.

use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::json;

use crate::api::dto::pagination::PaginationParams;
use crate::api::dto::stats::{PaginationMeta, StatsListResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Lists analytics records, most accessed first.
///
/// # Endpoint
///
/// `GET /stats`
///
/// # Query Parameters
///
/// - `page` (optional): Page number (default: 1)
/// - `page_size` (optional): Items per page (default: 25, max: 1000)
///
/// # Errors
///
/// Returns 400 Bad Request if pagination parameters are invalid.
pub async fn stats_list_handler(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<StatsListResponse>, AppError> {
    let (offset, limit) = params
        .validate_and_get_offset_limit()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let page_size = params.page_size();
    let (records, total_items) = state.analytics_service.list_records(offset, limit).await?;

    let total_pages = (total_items.max(0) as u64).div_ceil(page_size as u64) as u32;

    Ok(Json(StatsListResponse {
        pagination: PaginationMeta {
            page: params.page(),
            page_size,
            total_items,
            total_pages,
        },
        items: records.into_iter().map(Into::into).collect(),
    }))
}
