//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence, caching and messaging.
//!
//! # Modules
//!
//! - [`bus`] - Message bus backends (Redis and in-memory) and consumers
//! - [`cache`] - Redirect cache (Redis, in-memory and no-op implementations)
//! - [`persistence`] - PostgreSQL and in-memory repository implementations

pub mod bus;
pub mod cache;
pub mod persistence;
