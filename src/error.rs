// Error taxonomy for sampling, snapshot validation and construction-time config

use serde::{Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;

/// Failure reaching the metric source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("metric source timed out after {0:?}")]
    Timeout(Duration),
    #[error("metric source transport error: {0}")]
    Transport(String),
    #[error("metric source returned HTTP {0}")]
    Status(u16),
    #[error("metric source payload could not be decoded: {0}")]
    Decode(String),
}

/// A snapshot that arrived but fails shape/range checks. Never ingested.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedSnapshotError {
    #[error("{resource}: usage is not a finite number")]
    NonFinite { resource: String },
    #[error("{resource}: usage {value} outside [0, 100]")]
    OutOfRange { resource: String, value: f64 },
    #[error("{resource}: used {used} exceeds total {total}")]
    UsedExceedsTotal {
        resource: String,
        used: u64,
        total: u64,
    },
}

/// What a failed tick publishes as its `error`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] MalformedSnapshotError),
}

impl Serialize for SampleError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Rejected at construction, before any loop starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("warning_at ({warning_at}) must not exceed danger_at ({danger_at})")]
    InvalidThreshold { warning_at: f64, danger_at: f64 },
    #[error("threshold {value} outside [0, 100]")]
    ThresholdOutOfRange { value: f64 },
    #[error("history capacity must be > 0")]
    ZeroCapacity,
    #[error("sample interval must be > 0")]
    ZeroInterval,
}
