//! Message bus contract used to fan out propagation events.
//!
//! The bus is a set of named, durable, multi-consumer queues with
//! at-least-once delivery:
//!
//! 1. A publisher hands a message to the broker and returns; it never waits
//!    for a consumer.
//! 2. A consumer pulls one message at a time. The message moves to the
//!    queue's in-flight set until it is acknowledged.
//! 3. [`MessageBus::ack`] removes it for good. [`MessageBus::nack`] with
//!    `requeue = true` puts it back at the tail of the queue immediately,
//!    with no delay, so it may be picked up again by any worker once the
//!    messages already waiting have been handed out.
//!
//! Consumers must therefore tolerate duplicate delivery. Nothing orders
//! messages across workers draining the same queue.
//!
//! # Implementations
//!
//! - [`crate::infrastructure::bus::RedisBus`] - Redis lists (reliable queue pattern)
//! - [`crate::infrastructure::bus::MemoryBus`] - In-process queues for single-process mode and tests

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::error::AppError;

/// Message headers. Carries trace context such as [`REQUEST_ID_HEADER`].
pub type Headers = HashMap<String, String>;

/// Header holding the id of the request that caused the message.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Names of the queues connecting the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueNames {
    /// Carries [`crate::domain::events::MapPropagation`] to the redirect service.
    pub redirect: String,
    /// Carries [`crate::domain::events::AccessPropagation`] to the analytics service.
    pub analytic: String,
}

impl Default for QueueNames {
    fn default() -> Self {
        Self {
            redirect: "redirect".to_string(),
            analytic: "analytic".to_string(),
        }
    }
}

/// Errors raised by bus implementations.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Bus connection error: {0}")]
    Connection(String),
    #[error("Bus operation error: {0}")]
    Operation(String),
    #[error("Bus encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// A message as stored by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    #[serde(default)]
    pub headers: Headers,
    pub body: String,
    /// Number of times the message has been handed to a consumer.
    #[serde(default)]
    pub attempts: u32,
}

/// A message to publish.
#[derive(Debug, Clone, Default)]
pub struct OutboundMessage {
    pub headers: Headers,
    pub body: String,
}

/// A pulled message awaiting `ack` or `nack`.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub queue: String,
    pub envelope: Envelope,
    /// Broker-specific token identifying this delivery in the in-flight set.
    pub receipt: String,
}

impl Delivery {
    pub fn body(&self) -> &[u8] {
        self.envelope.body.as_bytes()
    }

    pub fn headers(&self) -> &Headers {
        &self.envelope.headers
    }

    /// 1 on first delivery, 2 on the first redelivery, and so on.
    pub fn delivery_count(&self) -> u32 {
        self.envelope.attempts
    }

    pub fn request_id(&self) -> Option<&str> {
        self.envelope
            .headers
            .get(REQUEST_ID_HEADER)
            .map(String::as_str)
    }
}

/// Ready and in-flight message counts for one queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepth {
    pub ready: u64,
    pub in_flight: u64,
}

/// Durable at-least-once queue abstraction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Declares a durable queue. Declaring an existing queue is a no-op.
    async fn declare_queue(&self, queue: &str) -> BusResult<()>;

    /// Hands a message to the broker.
    ///
    /// Returns once the broker has accepted the message; consumption happens
    /// later and independently.
    async fn publish(&self, queue: &str, message: OutboundMessage) -> BusResult<()>;

    /// Pulls the next ready message into the in-flight set.
    ///
    /// Returns `Ok(None)` when the queue is empty.
    async fn receive(&self, queue: &str) -> BusResult<Option<Delivery>>;

    /// Acknowledges a delivery, removing it permanently.
    async fn ack(&self, delivery: &Delivery) -> BusResult<()>;

    /// Rejects a delivery. With `requeue` the message goes back to the tail
    /// of the ready queue, behind anything already waiting; otherwise it is
    /// dropped.
    async fn nack(&self, delivery: &Delivery, requeue: bool) -> BusResult<()>;

    /// Reports ready and in-flight counts.
    async fn depth(&self, queue: &str) -> BusResult<QueueDepth>;

    /// Moves every in-flight message back to the ready queue.
    ///
    /// Used to recover messages stranded by a crashed worker. Running it while
    /// workers are active redelivers messages that are still being handled.
    async fn recover_in_flight(&self, queue: &str) -> BusResult<usize>;

    /// Checks if the broker is reachable.
    async fn health_check(&self) -> bool;
}

/// Handles one message pulled from a queue.
///
/// Returning an error makes the consumer negatively acknowledge the message
/// with requeue, so implementations must be safe to call again with the same
/// body.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, body: &[u8], headers: &Headers) -> Result<(), AppError>;
}

/// Serializes `payload` as JSON and publishes it.
pub async fn publish_json<T: Serialize + ?Sized>(
    bus: &dyn MessageBus,
    queue: &str,
    payload: &T,
    headers: Headers,
) -> BusResult<()> {
    let body = serde_json::to_string(payload)?;
    bus.publish(queue, OutboundMessage { headers, body }).await
}

/// Builds headers carrying the request id.
pub fn request_headers(request_id: &str) -> Headers {
    let mut headers = Headers::new();
    headers.insert(REQUEST_ID_HEADER.to_string(), request_id.to_string());
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_defaults_on_missing_fields() {
        let raw = r#"{"id":"m1","body":"{}"}"#;
        let envelope: Envelope = serde_json::from_str(raw).unwrap();

        assert_eq!(envelope.attempts, 0);
        assert!(envelope.headers.is_empty());
    }

    #[test]
    fn test_delivery_request_id() {
        let delivery = Delivery {
            queue: "q".to_string(),
            envelope: Envelope {
                id: "m1".to_string(),
                headers: request_headers("req42"),
                body: "{}".to_string(),
                attempts: 1,
            },
            receipt: "m1".to_string(),
        };

        assert_eq!(delivery.request_id(), Some("req42"));
        assert_eq!(delivery.delivery_count(), 1);
        assert_eq!(delivery.body(), b"{}");
    }

    #[tokio::test]
    async fn test_publish_json_serializes_payload() {
        let mut bus = MockMessageBus::new();
        bus.expect_publish()
            .withf(|queue, message| {
                queue == "analytic"
                    && message.body == r#"{"a":1}"#
                    && message.headers.get(REQUEST_ID_HEADER).map(String::as_str) == Some("r1")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let result = publish_json(
            &bus,
            "analytic",
            &serde_json::json!({ "a": 1 }),
            request_headers("r1"),
        )
        .await;

        assert!(result.is_ok());
    }
}
