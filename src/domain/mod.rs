//! Domain layer containing business entities and contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Store trait definitions
//! - [`events`] - Event envelopes carried on the bus
//! - [`bus`] - Message bus and consumer handler contracts
//!
//! # Propagation Flow
//!
//! 1. The mapping service persists a [`entities::UrlMapping`]
//! 2. It publishes an [`events::MapPropagation`] and an
//!    [`events::AccessPropagation`] without waiting for either
//! 3. The redirect consumer writes the cache and a [`entities::RedirectRecord`]
//! 4. The analytics consumer creates an [`entities::AnalyticRecord`]
//! 5. Each successful resolve publishes another `AccessPropagation`, which
//!    bumps the record's access count

pub mod bus;
pub mod entities;
pub mod events;
pub mod repositories;
