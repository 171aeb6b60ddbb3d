//! Repository implementations.
//!
//! PostgreSQL implementations of the domain repository traits, plus in-memory
//! implementations used when no database is configured.
//!
//! # Repositories
//!
//! - [`PgMappingRepository`] - Short code assignment
//! - [`PgRedirectRepository`] - Redirect fallback store
//! - [`PgAnalyticsRepository`] - Access ledger
//! - [`memory`] - In-memory counterparts of all three

pub mod memory;
pub mod pg_analytics_repository;
pub mod pg_mapping_repository;
pub mod pg_redirect_repository;

pub use memory::{MemoryAnalyticsRepository, MemoryMappingRepository, MemoryRedirectRepository};
pub use pg_analytics_repository::PgAnalyticsRepository;
pub use pg_mapping_repository::PgMappingRepository;
pub use pg_redirect_repository::PgRedirectRepository;
