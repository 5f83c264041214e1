//! Producer (master): synthesizes work items and pushes them onto a queue.

use crate::codec;
use crate::error::Result;
use crate::model::{ActorId, WorkItem};
use crate::queue::QueueStore;
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use std::time::Duration;
use tracing::{Instrument, Span, error, info, info_span};

/// Pause between iterations of [`Producer::start`].
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

pub struct Producer<Q> {
    store: Q,
    id: ActorId,
    queue_name: String,
    interval: Duration,
    span: Span,
}

impl<Q: QueueStore> Producer<Q> {
    /// A producer with a freshly generated `Master-…` id.
    pub fn new(store: Q, queue_name: impl Into<String>) -> Self {
        Self::with_id(store, queue_name, ActorId::generate("Master"))
    }

    pub fn with_id(store: Q, queue_name: impl Into<String>, id: ActorId) -> Self {
        let queue_name = queue_name.into();
        let span = info_span!("producer", "producer.id" = %id, queue = %queue_name);
        span.in_scope(|| info!("producer initialized"));
        Self {
            store,
            id,
            queue_name,
            interval: DEFAULT_INTERVAL,
            span,
        }
    }

    /// Override the pause between iterations.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// The store this producer pushes to.
    pub fn store(&self) -> &Q {
        &self.store
    }

    /// Build one work item and enqueue it.
    pub async fn run(&self) -> Result<WorkItem> {
        self.run_once().instrument(self.span.clone()).await
    }

    async fn run_once(&self) -> Result<WorkItem> {
        let pushed: Result<WorkItem> = async {
            let item = WorkItem::generate(&self.id)?;
            let payload = codec::encode(&item)?;
            self.store.push(&self.queue_name, &payload).await?;
            Ok(item)
        }
        .await;

        match pushed {
            Ok(item) => {
                metrics::items_produced()
                    .add(1, &[KeyValue::new("queue", self.queue_name.clone())]);
                info!(
                    payload = item.payload_name(),
                    created_at = item.created_at(),
                    "pushed work item"
                );
                Ok(item)
            }
            Err(e) => {
                error!(error = %e, "failed to push work item");
                Err(e)
            }
        }
    }

    /// Run `iterations` times in sequence, pausing between runs.
    ///
    /// Stops at the first failure and returns it. Items pushed before the
    /// failure stay on the queue. Returns the number of items pushed.
    pub async fn start(&self, iterations: u64) -> Result<u64> {
        async {
            info!(iterations, "producer starting");
            for i in 0..iterations {
                if i > 0 {
                    tokio::time::sleep(self.interval).await;
                }
                if let Err(e) = self.run_once().await {
                    error!(pushed = i, error = %e, "producer aborted");
                    return Err(e);
                }
            }
            info!(pushed = iterations, "producer finished");
            Ok(iterations)
        }
        .instrument(self.span.clone())
        .await
    }
}
