//! Issuer velocity — 24-hour transaction velocity feature for fraud scoring.
//!
//! Modular structure:
//! - [`normalizer`] — JSON Lines records → keyed events or typed rejections
//! - [`ordering`] — Stable time sort carrying input positions
//! - [`engine`] — Sliding-window per-key counter
//! - [`assembler`] — `(event, velocity)` records and NDJSON export
//! - [`pipeline`] — Batch runs, optionally sharded by key
//! - [`stream`] — Online runs over time-ordered input
//! - [`storage`] — SQLite result store
//! - [`scoring`] — Downstream model boundary
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod normalizer;
pub mod ordering;
pub mod engine;
pub mod assembler;
pub mod pipeline;
pub mod stream;
pub mod storage;
pub mod scoring;
pub mod logging;

pub use config::VelocityConfig;
pub use error::{RejectReason, VelocityError};
pub use normalizer::{Event, Outcome, Rejection, TransactionPayload};
pub use engine::{EngineState, VelocityEngine};
pub use assembler::VelocityRecord;
pub use pipeline::{BatchPipeline, RunReport, RunSummary};
pub use stream::StreamRunner;
pub use storage::VelocityStore;
pub use logging::StructuredLogger;
