//! Error types for workpipe.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed transport error from a queue store backend.
pub type StoreSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to encode work item: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode work item: {reason}")]
    Decode { reason: String },

    #[error("invalid work item: {reason}")]
    InvalidItem { reason: String },

    #[error("queue store unavailable (queue {queue:?}): {source}")]
    StoreUnavailable {
        queue: String,
        #[source]
        source: StoreSource,
    },

    #[error("failed to write result artifact {}: {source}", path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("telemetry: {0}")]
    Telemetry(String),
}

impl Error {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    pub(crate) fn store(queue: &str, source: impl Into<StoreSource>) -> Self {
        Self::StoreUnavailable {
            queue: queue.to_string(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
