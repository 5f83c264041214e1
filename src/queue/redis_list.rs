//! Redis list backend: `RPUSH` to enqueue, `BLPOP` to dequeue.

use super::QueueStore;
use crate::config::StoreConfig;
use crate::config::secrets::ExposeSecret;
use crate::error::{Error, Result};
use crate::telemetry::metrics::{operation_duration_ms, record_queue_op};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Redis-backed queue store.
///
/// Holds one multiplexed connection; every call works on a cheap clone of
/// it. The worker never issues commands concurrently with its own `BLPOP`,
/// so a blocking pop does not starve anything else.
pub struct RedisQueue {
    conn: MultiplexedConnection,
}

impl RedisQueue {
    /// Connect and `PING` the server so a bad host or password fails here,
    /// before any queue traffic.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let target = format!("{}:{}", config.host, config.port);
        let info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: redis::RedisConnectionInfo {
                password: Some(config.password.expose_secret().to_string()),
                ..Default::default()
            },
        };

        let client = redis::Client::open(info).map_err(|e| Error::store(&target, e))?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::store(&target, e))?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::store(&target, e))?;
        debug!(%target, reply = %pong, "redis ping");
        info!(%target, "connected to queue store");

        Ok(Self { conn })
    }

    async fn blpop(&self, queue: &str, timeout_secs: f64) -> Result<Option<Vec<u8>>> {
        let started = Instant::now();
        let mut conn = self.conn.clone();
        // The value is read as bytes: a list may hold anything, and a bad
        // payload must not look like a store failure.
        let reply: Option<(String, Vec<u8>)> = conn
            .blpop(queue, timeout_secs)
            .await
            .map_err(|e| Error::store(queue, e))?;

        operation_duration_ms().record(
            started.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("operation", "blpop")],
        );
        let payload = reply.map(|(_key, payload)| payload);
        record_queue_op(queue, if payload.is_some() { "pop" } else { "pop_empty" });
        Ok(payload)
    }
}

#[async_trait]
impl QueueStore for RedisQueue {
    async fn push(&self, queue: &str, payload: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let depth: i64 = conn
            .rpush(queue, payload)
            .await
            .map_err(|e| Error::store(queue, e))?;
        debug!(queue, depth, "rpush");
        record_queue_op(queue, "push");
        Ok(())
    }

    async fn blocking_pop(&self, queue: &str) -> Result<Vec<u8>> {
        loop {
            // A zero timeout blocks until an element arrives; a nil reply
            // should not happen, so just wait again.
            if let Some(payload) = self.blpop(queue, 0.0).await? {
                return Ok(payload);
            }
        }
    }

    async fn pop_timeout(&self, queue: &str, timeout: Duration) -> Result<Option<Vec<u8>>> {
        // BLPOP treats 0 as "forever"; never let a tiny timeout round to it.
        let secs = timeout.as_secs_f64().max(0.01);
        self.blpop(queue, secs).await
    }

    async fn len(&self, queue: &str) -> Result<usize> {
        let mut conn = self.conn.clone();
        let len: usize = conn.llen(queue).await.map_err(|e| Error::store(queue, e))?;
        record_queue_op(queue, "len");
        Ok(len)
    }
}
