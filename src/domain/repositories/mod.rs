//! Repository trait definitions for the domain layer.
//!
//! One trait per store. The stores never reference each other; they are kept
//! consistent only by the bus consumers.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`MappingRepository`] - Short code assignment
//! - [`RedirectRepository`] - Redirect fallback store
//! - [`AnalyticsRepository`] - Access ledger

pub mod analytics_repository;
pub mod mapping_repository;
pub mod redirect_repository;

pub use analytics_repository::AnalyticsRepository;
pub use mapping_repository::MappingRepository;
pub use redirect_repository::RedirectRepository;

#[cfg(test)]
pub use analytics_repository::MockAnalyticsRepository;
#[cfg(test)]
pub use mapping_repository::MockMappingRepository;
#[cfg(test)]
pub use redirect_repository::MockRedirectRepository;
