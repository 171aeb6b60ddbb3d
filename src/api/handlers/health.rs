//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` (in-memory stores always pass)
/// 2. **Cache**: Backend PING
/// 3. **Bus**: Broker PING
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (database, cache, bus) =
        tokio::join!(check_database(&state), check_cache(&state), check_bus(&state));

    let all_healthy = database.is_ok() && cache.is_ok() && bus.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        role: state.role.to_string(),
        checks: HealthChecks {
            database,
            cache,
            bus,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    let Some(ref pool) = state.db else {
        return CheckStatus::ok("In-memory stores");
    };

    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    if state.cache.health_check().await {
        CheckStatus::ok("Cache reachable")
    } else {
        CheckStatus::error("Cache connection failed")
    }
}

async fn check_bus(state: &AppState) -> CheckStatus {
    if state.bus.health_check().await {
        CheckStatus::ok("Bus reachable")
    } else {
        CheckStatus::error("Bus connection failed")
    }
}
