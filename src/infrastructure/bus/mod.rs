//! Message bus implementations and the consumer worker pool.
//!
//! - [`RedisBus`] - Durable queues on Redis lists
//! - [`MemoryBus`] - In-process queues for single-process mode and tests
//! - [`consumer`] - Worker pool that drives a [`crate::domain::bus::MessageHandler`]

pub mod consumer;
mod memory_bus;
mod redis_bus;

pub use consumer::{ConsumerHandle, ConsumerOptions};
pub use memory_bus::MemoryBus;
pub use redis_bus::RedisBus;
