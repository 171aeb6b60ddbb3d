//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! the redirect cache and the message bus. Services consume domain traits and
//! provide a clean API for HTTP handlers and bus consumers.
//!
//! # Available Services
//!
//! - [`services::mapping_service::MappingService`] - Short code assignment
//! - [`services::redirect_service::RedirectService`] - Resolution and redirect store replication
//! - [`services::analytics_service::AnalyticsService`] - Access ledger
//!
//! [`consumers`] adapts the services to bus message handlers.

pub mod consumers;
pub mod publish;
pub mod services;
