//! Queue store: named FIFO lists carrying JSON text payloads.
//!
//! Producers push to the tail, workers pop from the head. A pop removes the
//! item atomically, so each pushed payload reaches exactly one worker. This
//! is the only coordination point between processes.
//!
//! Pushes take text (producers always write JSON); pops return raw bytes,
//! since a list can hold anything another client put there.

pub mod memory;
pub mod redis_list;

pub use memory::MemoryQueue;
pub use redis_list::RedisQueue;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Default queue shared by the master and worker binaries.
pub const DEFAULT_QUEUE: &str = "work";

#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Append a payload to the tail of `queue`.
    async fn push(&self, queue: &str, payload: &str) -> Result<()>;

    /// Remove and return the head of `queue`, waiting as long as it takes.
    ///
    /// Payloads come back as raw bytes; a payload that is not valid UTF-8
    /// is the consumer's problem to reject, not a store failure.
    async fn blocking_pop(&self, queue: &str) -> Result<Vec<u8>>;

    /// Like [`blocking_pop`](Self::blocking_pop), but gives up after
    /// `timeout` and returns `None`.
    async fn pop_timeout(&self, queue: &str, timeout: Duration) -> Result<Option<Vec<u8>>>;

    /// Number of payloads waiting in `queue`.
    async fn len(&self, queue: &str) -> Result<usize>;
}

#[async_trait]
impl<Q: QueueStore + ?Sized> QueueStore for Arc<Q> {
    async fn push(&self, queue: &str, payload: &str) -> Result<()> {
        (**self).push(queue, payload).await
    }

    async fn blocking_pop(&self, queue: &str) -> Result<Vec<u8>> {
        (**self).blocking_pop(queue).await
    }

    async fn pop_timeout(&self, queue: &str, timeout: Duration) -> Result<Option<Vec<u8>>> {
        (**self).pop_timeout(queue, timeout).await
    }

    async fn len(&self, queue: &str) -> Result<usize> {
        (**self).len(queue).await
    }
}
