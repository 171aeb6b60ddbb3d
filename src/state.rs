//! Shared application state injected into every handler.

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{AnalyticsService, MappingService, RedirectService};
use crate::config::Role;
use crate::domain::bus::MessageBus;
use crate::infrastructure::cache::CacheService;

#[derive(Clone)]
pub struct AppState {
    pub role: Role,
    pub mapping_service: Arc<MappingService>,
    pub redirect_service: Arc<RedirectService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub cache: Arc<dyn CacheService>,
    pub bus: Arc<dyn MessageBus>,
    /// `None` when the stores run in memory.
    pub db: Option<PgPool>,
    pub metrics: PrometheusHandle,
}
