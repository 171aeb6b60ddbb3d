//! Fire-and-forget event publishing.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use crate::domain::bus::{MessageBus, publish_json, request_headers};

/// Publishes `payload` on a detached task.
///
/// The caller never learns the outcome. Failures are logged and counted in
/// `bus_publish_failures_total`; nothing retries them.
pub fn spawn_publish<T>(bus: Arc<dyn MessageBus>, queue: String, payload: T, request_id: String)
where
    T: Serialize + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let headers = request_headers(&request_id);
        match publish_json(bus.as_ref(), &queue, &payload, headers).await {
            Ok(()) => {
                debug!(queue = %queue, request_id = %request_id, "Event published");
                metrics::counter!("bus_publishes_total", "queue" => queue).increment(1);
            }
            Err(e) => {
                error!(queue = %queue, request_id = %request_id, "Failed to publish event: {}", e);
                metrics::counter!("bus_publish_failures_total", "queue" => queue).increment(1);
            }
        }
    });
}
