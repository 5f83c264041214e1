//! Core data model.
//!
//! A work item names one file to materialize. It records which producer
//! made it and when. Items are immutable: built once by a producer, then
//! only read.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Actor IDs
// ---------------------------------------------------------------------------

/// Identity of a producer or worker process instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Fresh id of the form `<prefix>-<8 hex chars>`.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{prefix}-{}", short_uuid()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ActorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Random payload name, `file-<8 hex chars>.txt`.
pub fn generate_payload_name() -> String {
    format!("file-{}.txt", short_uuid())
}

fn short_uuid() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

// ---------------------------------------------------------------------------
// Work Item
// ---------------------------------------------------------------------------

/// A unit of work handed from a producer to a worker.
///
/// Field names on the wire are `master_id`, `filename` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    #[serde(rename = "master_id")]
    producer_id: ActorId,

    #[serde(rename = "filename")]
    payload_name: String,

    /// Seconds since the Unix epoch, fractional.
    #[serde(rename = "timestamp")]
    created_at: f64,
}

impl WorkItem {
    /// Build and validate a work item.
    pub fn new(producer_id: ActorId, payload_name: impl Into<String>, created_at: f64) -> Result<Self> {
        let item = Self {
            producer_id,
            payload_name: payload_name.into(),
            created_at,
        };
        item.validate().map_err(|reason| Error::InvalidItem { reason })?;
        Ok(item)
    }

    /// A fresh item stamped with the current time.
    pub fn generate(producer_id: &ActorId) -> Result<Self> {
        Self::new(producer_id.clone(), generate_payload_name(), now_secs())
    }

    pub fn producer_id(&self) -> &ActorId {
        &self.producer_id
    }

    pub fn payload_name(&self) -> &str {
        &self.payload_name
    }

    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    /// Check the invariants that decoding alone cannot express.
    ///
    /// `producer_id` and `payload_name` end up as directory and file names,
    /// so both must be single, non-empty path segments.
    ///
    /// The caller picks the error variant: built items fail with
    /// [`Error::InvalidItem`], decoded ones with [`Error::Decode`].
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        check_segment("master_id", self.producer_id.as_str())?;
        check_segment("filename", &self.payload_name)?;
        if !self.created_at.is_finite() {
            return Err(format!("timestamp must be finite, got {}", self.created_at));
        }
        Ok(())
    }
}

fn check_segment(field: &str, value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if value == "." || value == ".." || value.contains(['/', '\\', '\0']) {
        return Err(format!("{field} must be a plain name, got {value:?}"));
    }
    Ok(())
}

/// Current wall-clock time as fractional seconds since the epoch.
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
