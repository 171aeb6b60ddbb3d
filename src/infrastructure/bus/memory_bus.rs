//! In-process message bus.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::domain::bus::{
    BusError, BusResult, Delivery, Envelope, MessageBus, OutboundMessage, QueueDepth,
};

#[derive(Debug, Default)]
struct Queue {
    ready: VecDeque<Envelope>,
    in_flight: HashMap<String, Envelope>,
}

/// Message bus holding queues in process memory.
///
/// Same semantics as the Redis bus (FIFO, in-flight tracking, requeue to the
/// tail) but nothing survives a restart. Used in single-process mode and
/// tests. Publishing to an undeclared queue declares it.
#[derive(Debug, Default)]
pub struct MemoryBus {
    queues: Mutex<HashMap<String, Queue>>,
    next_id: AtomicU64,
    fail_publishes: AtomicBool,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every publish fail until switched off.
    pub fn set_fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Queue>> {
        self.queues.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    async fn declare_queue(&self, queue: &str) -> BusResult<()> {
        self.lock().entry(queue.to_string()).or_default();
        Ok(())
    }

    async fn publish(&self, queue: &str, message: OutboundMessage) -> BusResult<()> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(BusError::Connection("memory bus publishes disabled".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let envelope = Envelope {
            id: id.to_string(),
            headers: message.headers,
            body: message.body,
            attempts: 0,
        };
        self.lock()
            .entry(queue.to_string())
            .or_default()
            .ready
            .push_back(envelope);
        Ok(())
    }

    async fn receive(&self, queue: &str) -> BusResult<Option<Delivery>> {
        let mut queues = self.lock();
        let Some(q) = queues.get_mut(queue) else {
            return Ok(None);
        };
        let Some(mut envelope) = q.ready.pop_front() else {
            return Ok(None);
        };

        envelope.attempts += 1;
        let receipt = format!("{}#{}", envelope.id, envelope.attempts);
        q.in_flight.insert(receipt.clone(), envelope.clone());

        Ok(Some(Delivery {
            queue: queue.to_string(),
            envelope,
            receipt,
        }))
    }

    async fn ack(&self, delivery: &Delivery) -> BusResult<()> {
        if let Some(q) = self.lock().get_mut(&delivery.queue) {
            q.in_flight.remove(&delivery.receipt);
        }
        Ok(())
    }

    async fn nack(&self, delivery: &Delivery, requeue: bool) -> BusResult<()> {
        let mut queues = self.lock();
        let Some(q) = queues.get_mut(&delivery.queue) else {
            return Ok(());
        };

        if let Some(envelope) = q.in_flight.remove(&delivery.receipt)
            && requeue
        {
            q.ready.push_back(envelope);
        }
        Ok(())
    }

    async fn depth(&self, queue: &str) -> BusResult<QueueDepth> {
        Ok(self
            .lock()
            .get(queue)
            .map(|q| QueueDepth {
                ready: q.ready.len() as u64,
                in_flight: q.in_flight.len() as u64,
            })
            .unwrap_or_default())
    }

    async fn recover_in_flight(&self, queue: &str) -> BusResult<usize> {
        let mut queues = self.lock();
        let Some(q) = queues.get_mut(queue) else {
            return Ok(0);
        };

        let stranded: Vec<Envelope> = q.in_flight.drain().map(|(_, e)| e).collect();
        let moved = stranded.len();
        for envelope in stranded {
            q.ready.push_front(envelope);
        }
        Ok(moved)
    }

    async fn health_check(&self) -> bool {
        true
    }
}
