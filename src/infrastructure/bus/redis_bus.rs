//! Redis-backed message bus using the reliable queue pattern.
//!
//! Each queue is two lists:
//!
//! - `bus:{queue}:ready` - producers and requeues `LPUSH`, consumers take from
//!   the right
//! - `bus:{queue}:in_flight` - holds taken messages until ack or nack
//!
//! A message moves between the lists with a single `LMOVE`, so a consumer that
//! dies mid-handling leaves it in `in_flight` where
//! [`MessageBus::recover_in_flight`] can return it. Lists live in Redis, so
//! queues survive process restarts as long as Redis persists its data.

use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

use crate::domain::bus::{
    BusError, BusResult, Delivery, Envelope, MessageBus, OutboundMessage, QueueDepth,
};
use crate::utils::code_generator::generate_request_id;

const QUEUES_KEY: &str = "bus:queues";

impl From<redis::RedisError> for BusError {
    fn from(e: redis::RedisError) -> Self {
        BusError::Operation(e.to_string())
    }
}

pub struct RedisBus {
    conn: ConnectionManager,
}

impl RedisBus {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Connection`] if the URL is invalid or Redis is
    /// unreachable.
    pub async fn connect(url: &str) -> BusResult<Self> {
        info!("Connecting to message bus");

        let client = Client::open(url)
            .map_err(|e| BusError::Connection(format!("Failed to create Redis client: {}", e)))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| BusError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = conn.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| BusError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("Connected to message bus");
        Ok(Self { conn })
    }

    fn ready_key(queue: &str) -> String {
        format!("bus:{}:ready", queue)
    }

    fn in_flight_key(queue: &str) -> String {
        format!("bus:{}:in_flight", queue)
    }
}

#[async_trait]
impl MessageBus for RedisBus {
    async fn declare_queue(&self, queue: &str) -> BusResult<()> {
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(QUEUES_KEY, queue).await?;
        debug!(queue, "Queue declared");
        Ok(())
    }

    async fn publish(&self, queue: &str, message: OutboundMessage) -> BusResult<()> {
        let envelope = Envelope {
            id: format!("{}-{}", Utc::now().timestamp_millis(), generate_request_id()),
            headers: message.headers,
            body: message.body,
            attempts: 0,
        };
        let raw = serde_json::to_string(&envelope)?;

        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(Self::ready_key(queue), raw).await?;

        debug!(queue, message_id = %envelope.id, "Message published");
        Ok(())
    }

    async fn receive(&self, queue: &str) -> BusResult<Option<Delivery>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("LMOVE")
            .arg(Self::ready_key(queue))
            .arg(Self::in_flight_key(queue))
            .arg("RIGHT")
            .arg("LEFT")
            .query_async(&mut conn)
            .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let mut envelope: Envelope = serde_json::from_str(&raw)?;
        envelope.attempts += 1;

        Ok(Some(Delivery {
            queue: queue.to_string(),
            envelope,
            receipt: raw,
        }))
    }

    async fn ack(&self, delivery: &Delivery) -> BusResult<()> {
        let mut conn = self.conn.clone();
        conn.lrem::<_, _, ()>(Self::in_flight_key(&delivery.queue), 1, &delivery.receipt)
            .await?;
        Ok(())
    }

    async fn nack(&self, delivery: &Delivery, requeue: bool) -> BusResult<()> {
        let in_flight = Self::in_flight_key(&delivery.queue);
        let mut conn = self.conn.clone();

        if !requeue {
            conn.lrem::<_, _, ()>(in_flight, 1, &delivery.receipt).await?;
            return Ok(());
        }

        // The envelope carries the bumped attempt count back into the queue,
        // behind messages already waiting so one failing message cannot
        // starve the rest.
        let raw = serde_json::to_string(&delivery.envelope)?;
        redis::pipe()
            .atomic()
            .cmd("LREM")
            .arg(&in_flight)
            .arg(1)
            .arg(&delivery.receipt)
            .ignore()
            .cmd("LPUSH")
            .arg(Self::ready_key(&delivery.queue))
            .arg(raw)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;

        Ok(())
    }

    async fn depth(&self, queue: &str) -> BusResult<QueueDepth> {
        let mut conn = self.conn.clone();
        let ready: u64 = conn.llen(Self::ready_key(queue)).await?;
        let in_flight: u64 = conn.llen(Self::in_flight_key(queue)).await?;

        Ok(QueueDepth { ready, in_flight })
    }

    async fn recover_in_flight(&self, queue: &str) -> BusResult<usize> {
        let mut conn = self.conn.clone();
        let mut moved = 0;

        loop {
            let raw: Option<String> = redis::cmd("LMOVE")
                .arg(Self::in_flight_key(queue))
                .arg(Self::ready_key(queue))
                .arg("RIGHT")
                .arg("RIGHT")
                .query_async(&mut conn)
                .await?;

            if raw.is_none() {
                break;
            }
            moved += 1;
        }

        info!(queue, moved, "Recovered in-flight messages");
        Ok(moved)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }
}
