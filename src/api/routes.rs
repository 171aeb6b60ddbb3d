//! API route configuration.
//!
//! Routes are grouped by the service that owns them so a process only exposes
//! the endpoints of its role.

use crate::api::handlers::{
    redirect_handler, shorten_handler, stats_handler, stats_list_handler,
};
use crate::config::Role;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// `POST /shorten` - Create a mapping
pub fn mapper_routes() -> Router<AppState> {
    Router::new().route("/shorten", post(shorten_handler))
}

/// `GET /redirect?url={code}` - Resolve a short code
pub fn redirect_routes() -> Router<AppState> {
    Router::new().route("/redirect", get(redirect_handler))
}

/// Analytics read surface.
///
/// - `GET /stats`        - Records, most accessed first (paginated)
/// - `GET /stats/{code}` - Record for one short code
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats_list_handler))
        .route("/stats/{code}", get(stats_handler))
}

/// Routes served by `role`.
pub fn role_routes(role: Role) -> Router<AppState> {
    let mut router = Router::new();

    if role.runs_mapper() {
        router = router.merge(mapper_routes());
    }
    if role.runs_redirect() {
        router = router.merge(redirect_routes());
    }
    if role.runs_analytics() {
        router = router.merge(analytics_routes());
    }

    router
}
