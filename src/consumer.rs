//! Consumer (worker): pops work items and writes one result file per item.
//!
//! Lifecycle: `Idle → Waiting → Processing → Waiting → … → Stopped`, or
//! `→ Failed` when the queue store goes away. A bad payload or a failed
//! file write only skips that item; the loop keeps going.

use crate::codec;
use crate::error::{Error, Result};
use crate::model::{ActorId, WorkItem, now_secs};
use crate::queue::QueueStore;
use crate::telemetry::metrics;
use crate::telemetry::work::{record_state_transition, start_item_span};
use opentelemetry::KeyValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{Instrument, Span, error, info, info_span};

/// How long each pop waits before the shutdown flag is checked again.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Idle,
    Waiting,
    Processing,
    Stopped,
    Failed,
}

impl ConsumerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Waiting => "waiting",
            Self::Processing => "processing",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one call to [`Consumer::run`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    /// An item was processed and its result file written here.
    Written(PathBuf),
    /// An item was popped but could not be processed; it is gone.
    Skipped,
    /// Shutdown was requested before an item arrived.
    Stopped,
}

/// Cloneable handle that asks a consumer to stop.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug, Default)]
struct ShutdownInner {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    async fn triggered(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}

pub struct Consumer<Q> {
    store: Q,
    id: ActorId,
    queue_name: String,
    result_root: PathBuf,
    poll_interval: Option<Duration>,
    shutdown: ShutdownHandle,
    span: Span,
}

impl<Q: QueueStore> Consumer<Q> {
    /// A consumer with a freshly generated `Worker-…` id.
    pub fn new(store: Q, queue_name: impl Into<String>, result_root: impl Into<PathBuf>) -> Self {
        Self::with_id(store, queue_name, result_root, ActorId::generate("Worker"))
    }

    pub fn with_id(
        store: Q,
        queue_name: impl Into<String>,
        result_root: impl Into<PathBuf>,
        id: ActorId,
    ) -> Self {
        let queue_name = queue_name.into();
        let span = info_span!("consumer", "worker.id" = %id, queue = %queue_name);
        span.in_scope(|| info!("worker initialized"));
        Self {
            store,
            id,
            queue_name,
            result_root: result_root.into(),
            poll_interval: Some(DEFAULT_POLL_INTERVAL),
            shutdown: ShutdownHandle::default(),
            span,
        }
    }

    /// Set the pop timeout between shutdown checks.
    ///
    /// `None` waits on a single unbounded pop. Shutdown then abandons the
    /// pop mid-flight, and a payload the store hands over at that moment is
    /// lost.
    pub fn with_poll_interval(mut self, interval: Option<Duration>) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn result_root(&self) -> &Path {
        &self.result_root
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Wait for one item and process it.
    ///
    /// Only queue store failures are returned as errors.
    pub async fn run(&self) -> Result<Cycle> {
        self.run_once().instrument(self.span.clone()).await
    }

    /// Process items until shutdown is requested.
    pub async fn start(&self) -> Result<()> {
        async {
            info!(state = %ConsumerState::Idle, "worker starting, waiting for messages");
            loop {
                match self.run_once().await {
                    Ok(Cycle::Stopped) => {
                        info!(state = %ConsumerState::Stopped, "worker stopped by user");
                        return Ok(());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(state = %ConsumerState::Failed, error = %e, "worker hit a fatal error");
                        return Err(e);
                    }
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    async fn run_once(&self) -> Result<Cycle> {
        match self.next_payload().await? {
            Some(payload) => Ok(self.process(&payload).await),
            None => Ok(Cycle::Stopped),
        }
    }

    /// `None` once shutdown has been requested.
    async fn next_payload(&self) -> Result<Option<Vec<u8>>> {
        let Some(interval) = self.poll_interval else {
            if self.shutdown.is_triggered() {
                return Ok(None);
            }
            return tokio::select! {
                biased;
                _ = self.shutdown.triggered() => Ok(None),
                payload = self.store.blocking_pop(&self.queue_name) => payload.map(Some),
            };
        };

        loop {
            if self.shutdown.is_triggered() {
                return Ok(None);
            }
            if let Some(payload) = self.store.pop_timeout(&self.queue_name, interval).await? {
                return Ok(Some(payload));
            }
        }
    }

    async fn process(&self, payload: &[u8]) -> Cycle {
        let item = match codec::decode_bytes(payload) {
            Ok(item) => item,
            Err(e) => {
                let payload = String::from_utf8_lossy(payload);
                error!(error = %e, payload = %payload, "discarding malformed payload");
                self.count_consumed("skipped");
                return Cycle::Skipped;
            }
        };

        let span = start_item_span(&self.id, &item);
        record_state_transition(
            &span,
            ConsumerState::Waiting.as_str(),
            ConsumerState::Processing.as_str(),
        );
        let written = self.write_artifact(&item).instrument(span.clone()).await;
        record_state_transition(
            &span,
            ConsumerState::Processing.as_str(),
            ConsumerState::Waiting.as_str(),
        );

        match written {
            Ok(path) => {
                span.in_scope(|| info!(path = %path.display(), "created result file"));
                self.count_consumed("written");
                Cycle::Written(path)
            }
            Err(e) => {
                span.in_scope(|| error!(error = %e, "failed to write result file"));
                self.count_consumed("skipped");
                Cycle::Skipped
            }
        }
    }

    /// Write `<root>/<worker>/<producer>/<payload>`, creating directories.
    async fn write_artifact(&self, item: &WorkItem) -> Result<PathBuf> {
        let dir = self
            .result_root
            .join(self.id.as_str())
            .join(item.producer_id().as_str());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| Error::ArtifactWrite {
                path: dir.clone(),
                source,
            })?;

        let path = dir.join(item.payload_name());
        let line = format!(
            "Worker {} wrote this file at {} for message received at {} from {}",
            self.id,
            now_secs(),
            item.created_at(),
            item.producer_id(),
        );
        tokio::fs::write(&path, line)
            .await
            .map_err(|source| Error::ArtifactWrite {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    fn count_consumed(&self, result: &'static str) {
        metrics::items_consumed().add(
            1,
            &[
                KeyValue::new("queue", self.queue_name.clone()),
                KeyValue::new("result", result),
            ],
        );
    }
}
