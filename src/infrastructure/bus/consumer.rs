//! Worker pool draining one queue into a [`MessageHandler`].
//!
//! Each worker pulls one message, runs the handler, then acks on success or
//! nacks with requeue on failure. Workers share nothing but the bus, so
//! messages from the same queue are handled concurrently and in no
//! particular order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::domain::bus::{Delivery, MessageBus, MessageHandler};

/// Number of workers per queue unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 9;

#[derive(Debug, Clone)]
pub struct ConsumerOptions {
    /// Workers draining the queue.
    pub concurrency: usize,
    /// Sleep between polls of an empty queue.
    pub poll_interval: Duration,
    /// Drop a message once it has been delivered this many times.
    /// `None` retries forever.
    pub max_deliveries: Option<u32>,
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            poll_interval: Duration::from_millis(100),
            max_deliveries: None,
        }
    }
}

/// Running worker pool. Dropping the handle leaves the workers running.
pub struct ConsumerHandle {
    queue: String,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl ConsumerHandle {
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Stops pulling new messages and waits for in-progress ones to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(queue = %self.queue, "Consumer worker panicked: {}", e);
            }
        }
        info!(queue = %self.queue, "Consumer stopped");
    }
}

/// Spawns `options.concurrency` workers on `queue`.
pub fn spawn(
    bus: Arc<dyn MessageBus>,
    queue: impl Into<String>,
    handler: Arc<dyn MessageHandler>,
    options: ConsumerOptions,
) -> ConsumerHandle {
    let queue = queue.into();
    let (tx, rx) = watch::channel(false);
    let concurrency = options.concurrency.max(1);

    let workers = (0..concurrency)
        .map(|worker| {
            let bus = Arc::clone(&bus);
            let handler = Arc::clone(&handler);
            let queue = queue.clone();
            let options = options.clone();
            let rx = rx.clone();
            tokio::spawn(run_worker(worker, bus, queue, handler, options, rx))
        })
        .collect();

    info!(queue = %queue, concurrency, "Consumer started");

    ConsumerHandle {
        queue,
        shutdown: tx,
        workers,
    }
}

async fn run_worker(
    worker: usize,
    bus: Arc<dyn MessageBus>,
    queue: String,
    handler: Arc<dyn MessageHandler>,
    options: ConsumerOptions,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(queue = %queue, worker, "Worker started");

    while !*shutdown.borrow() {
        match bus.receive(&queue).await {
            Ok(Some(delivery)) => {
                let span = info_span!(
                    "consume",
                    queue = %queue,
                    worker,
                    request_id = delivery.request_id().unwrap_or("-"),
                    delivery = delivery.delivery_count(),
                );
                process(bus.as_ref(), handler.as_ref(), &options, delivery)
                    .instrument(span)
                    .await;
                // A requeued message comes straight back; let other tasks run.
                tokio::task::yield_now().await;
            }
            Ok(None) => idle(&mut shutdown, options.poll_interval).await,
            Err(e) => {
                warn!(queue = %queue, worker, "Failed to receive message: {}", e);
                idle(&mut shutdown, options.poll_interval).await;
            }
        }
    }

    debug!(queue = %queue, worker, "Worker stopped");
}

async fn idle(shutdown: &mut watch::Receiver<bool>, interval: Duration) {
    tokio::select! {
        _ = tokio::time::sleep(interval) => {}
        _ = shutdown.changed() => {}
    }
}

async fn process(
    bus: &dyn MessageBus,
    handler: &dyn MessageHandler,
    options: &ConsumerOptions,
    delivery: Delivery,
) {
    let queue = delivery.queue.clone();

    if let Some(max) = options.max_deliveries
        && delivery.delivery_count() > max
    {
        error!(
            body = %String::from_utf8_lossy(delivery.body()),
            "Dropping message after {} deliveries",
            max
        );
        metrics::counter!("bus_messages_dropped_total", "queue" => queue).increment(1);
        if let Err(e) = bus.nack(&delivery, false).await {
            warn!("Failed to drop message: {}", e);
        }
        return;
    }

    match handler.handle(delivery.body(), delivery.headers()).await {
        Ok(()) => {
            metrics::counter!("bus_messages_acked_total", "queue" => queue).increment(1);
            if let Err(e) = bus.ack(&delivery).await {
                warn!("Failed to ack message: {}", e);
            }
        }
        Err(e) => {
            warn!("Handler failed, requeueing: {}", e);
            metrics::counter!("bus_messages_requeued_total", "queue" => queue).increment(1);
            if let Err(e) = bus.nack(&delivery, true).await {
                warn!("Failed to requeue message: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bus::{Headers, OutboundMessage};
    use crate::error::AppError;
    use crate::infrastructure::bus::MemoryBus;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Records bodies and fails the first `fail_first` calls.
    #[derive(Default)]
    struct RecordingHandler {
        calls: AtomicU32,
        fail_first: u32,
        fail_always: bool,
        /// Body that always fails.
        fail_body: Option<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageHandler for RecordingHandler {
        async fn handle(&self, body: &[u8], _headers: &Headers) -> Result<(), AppError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_always
                || call <= self.fail_first
                || self.fail_body.is_some_and(|b| b.as_bytes() == body)
            {
                return Err(AppError::internal("boom", json!({})));
            }
            self.seen
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(body).into_owned());
            Ok(())
        }
    }

    fn fast_options(concurrency: usize, max_deliveries: Option<u32>) -> ConsumerOptions {
        ConsumerOptions {
            concurrency,
            poll_interval: Duration::from_millis(5),
            max_deliveries,
        }
    }

    async fn publish(bus: &MemoryBus, body: &str) {
        bus.publish(
            "q",
            OutboundMessage {
                body: body.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_consumes_and_acks_all_messages() {
        let bus = Arc::new(MemoryBus::new());
        let handler = Arc::new(RecordingHandler::default());
        for i in 0..20 {
            publish(&bus, &i.to_string()).await;
        }

        let handle = spawn(bus.clone(), "q", handler.clone(), fast_options(4, None));
        wait_until(|| handler.seen.lock().unwrap().len() == 20).await;
        handle.shutdown().await;

        let depth = bus.depth("q").await.unwrap();
        assert_eq!(depth.ready + depth.in_flight, 0);
    }

    #[tokio::test]
    async fn test_failed_message_is_redelivered() {
        let bus = Arc::new(MemoryBus::new());
        let handler = Arc::new(RecordingHandler {
            fail_first: 1,
            ..Default::default()
        });
        publish(&bus, "once").await;

        let handle = spawn(bus.clone(), "q", handler.clone(), fast_options(1, None));
        wait_until(|| handler.seen.lock().unwrap().len() == 1).await;
        handle.shutdown().await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        assert_eq!(handler.seen.lock().unwrap()[0], "once");
    }

    #[tokio::test]
    async fn test_failing_message_does_not_block_queue() {
        let bus = Arc::new(MemoryBus::new());
        let handler = Arc::new(RecordingHandler {
            fail_body: Some("stuck"),
            ..Default::default()
        });
        publish(&bus, "stuck").await;
        publish(&bus, "fine").await;

        let handle = spawn(bus.clone(), "q", handler.clone(), fast_options(1, None));
        wait_until(|| handler.seen.lock().unwrap().iter().any(|b| b == "fine")).await;
        handle.shutdown().await;

        // "stuck" keeps cycling; it is the only message left.
        let depth = bus.depth("q").await.unwrap();
        assert_eq!(depth.ready + depth.in_flight, 1);
    }

    #[tokio::test]
    async fn test_message_dropped_after_max_deliveries() {
        let bus = Arc::new(MemoryBus::new());
        let handler = Arc::new(RecordingHandler {
            fail_always: true,
            ..Default::default()
        });
        publish(&bus, "poison").await;

        let handle = spawn(bus.clone(), "q", handler.clone(), fast_options(1, Some(3)));
        wait_until(|| handler.calls.load(Ordering::SeqCst) == 3).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown().await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
        let depth = bus.depth("q").await.unwrap();
        assert_eq!(depth.ready + depth.in_flight, 0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_workers() {
        let bus = Arc::new(MemoryBus::new());
        let handler = Arc::new(RecordingHandler::default());

        let handle = spawn(bus, "q", handler, fast_options(3, None));
        assert_eq!(handle.queue(), "q");

        tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .expect("workers should stop promptly");
    }
}
