//! Per-item span helpers.
//!
//! Every popped item gets an `item.consume` span; the consumer state
//! machine records its transitions on it.

use tracing::Span;

use crate::model::{ActorId, WorkItem};

/// Start a span for consuming one work item.
///
/// The `item.state` field is declared empty and updated by
/// [`record_state_transition`].
pub fn start_item_span(worker_id: &ActorId, item: &WorkItem) -> Span {
    tracing::info_span!(
        "item.consume",
        "worker.id" = %worker_id,
        "producer.id" = %item.producer_id(),
        "item.payload" = item.payload_name(),
        "item.created_at" = item.created_at(),
        "item.state" = tracing::field::Empty,
    )
}

/// Record a state transition on the given span.
pub fn record_state_transition(span: &Span, from: &str, to: &str) {
    span.record("item.state", to);
    span.in_scope(|| {
        tracing::debug!(from = from, to = to, "state_transition");
    });
}
