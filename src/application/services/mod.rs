//! Business logic services for the application layer.

pub mod analytics_service;
pub mod mapping_service;
pub mod redirect_service;

pub use analytics_service::AnalyticsService;
pub use mapping_service::MappingService;
pub use redirect_service::{DEFAULT_CACHE_TTL, RedirectService, Resolution, ResolveSource};
