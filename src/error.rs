//! Run-level errors and per-record rejection reasons.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Fatal run-level failures. Malformed input records are not errors here;
/// they surface as [`crate::normalizer::Rejection`] values.
#[derive(Debug, Error)]
pub enum VelocityError {
    #[error(
        "unsorted input: event '{event_id}' at {current} precedes previously processed time {previous}"
    )]
    UnsortedInput {
        event_id: String,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("window capacity exceeded: {limit} live events")]
    CapacityExceeded { limit: usize },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("shard worker panicked")]
    WorkerPanicked,
}

/// Why a single input record was rejected before reaching the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("timestamp '{0}' could not be parsed")]
    UnparsableTimestamp(String),

    #[error("no entity key resolvable for '{0}'")]
    MissingEntityKey(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
