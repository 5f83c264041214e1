//! Metric instrument factories for workpipe.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without an OTLP endpoint the global provider is a no-op.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("workpipe")
}

/// Counter: queue store operations.
/// Labels: `queue`, `operation` ("push" | "pop" | "pop_empty" | "len").
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("workpipe.queue.operations")
        .with_description("Number of queue store operations")
        .build()
}

/// Counter: work items pushed by producers.
/// Labels: `queue`.
pub fn items_produced() -> Counter<u64> {
    meter()
        .u64_counter("workpipe.items.produced")
        .with_description("Number of work items enqueued")
        .build()
}

/// Counter: work items popped by workers.
/// Labels: `queue`, `result` ("written" | "skipped").
pub fn items_consumed() -> Counter<u64> {
    meter()
        .u64_counter("workpipe.items.consumed")
        .with_description("Number of work items consumed")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("workpipe.operation.duration_ms")
        .with_description("Operation duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Shorthand for counting one queue operation.
pub fn record_queue_op(queue: &str, operation: &'static str) {
    queue_operations().add(
        1,
        &[
            KeyValue::new("queue", queue.to_string()),
            KeyValue::new("operation", operation),
        ],
    );
}
