//! In-process queue store.
//!
//! Named `VecDeque`s behind a mutex, with a `Notify` to wake blocked
//! poppers. Used by the tests and for single-process runs without Redis.

use super::QueueStore;
use crate::error::Result;
use crate::telemetry::metrics::record_queue_op;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<String, VecDeque<Vec<u8>>>>,
    pushed: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn queues(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Vec<u8>>>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push arbitrary bytes, including ones a well-behaved producer would
    /// never write.
    pub fn push_bytes(&self, queue: &str, payload: &[u8]) {
        self.queues()
            .entry(queue.to_string())
            .or_default()
            .push_back(payload.to_vec());
        // Waiters may be parked on other queues; wake them all and let each
        // recheck its own.
        self.pushed.notify_waiters();
        record_queue_op(queue, "push");
    }

    fn try_pop(&self, queue: &str) -> Option<Vec<u8>> {
        self.queues().get_mut(queue).and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl QueueStore for MemoryQueue {
    async fn push(&self, queue: &str, payload: &str) -> Result<()> {
        self.push_bytes(queue, payload.as_bytes());
        Ok(())
    }

    async fn blocking_pop(&self, queue: &str) -> Result<Vec<u8>> {
        loop {
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the
            // await is not missed.
            notified.as_mut().enable();

            if let Some(payload) = self.try_pop(queue) {
                record_queue_op(queue, "pop");
                return Ok(payload);
            }
            notified.await;
        }
    }

    async fn pop_timeout(&self, queue: &str, timeout: Duration) -> Result<Option<Vec<u8>>> {
        match tokio::time::timeout(timeout, self.blocking_pop(queue)).await {
            Ok(payload) => payload.map(Some),
            Err(_elapsed) => {
                record_queue_op(queue, "pop_empty");
                Ok(None)
            }
        }
    }

    async fn len(&self, queue: &str) -> Result<usize> {
        Ok(self.queues().get(queue).map_or(0, VecDeque::len))
    }
}
