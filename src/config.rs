//! Run configuration. Loaded from a JSON file; every section has defaults.

use crate::error::VelocityError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    /// Batch (sort then compute) or stream (time-ordered online input)
    pub mode: RunMode,
    pub input: InputConfig,
    /// Window length and capacity
    pub window: WindowConfig,
    pub output: OutputConfig,
    pub pipeline: PipelineConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Batch,
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// Nested customer records (payment methods + transactions per line)
    Customers,
    /// Flat `{entity_key, event_time, event_id, payload}` lines
    Events,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputOrder {
    /// Time-sorted processing order
    Time,
    /// Original input order, restored by a stable re-sort on input index
    Input,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// JSON Lines input; `None` reads stdin
    pub path: Option<PathBuf>,
    pub format: InputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Trailing window length in seconds
    pub window_secs: u64,
    /// Hard cap on live window entries, enforced per engine (so per shard in
    /// sharded batch runs); `None` disables the cap
    pub max_live_events: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// NDJSON export of augmented records; `None` writes stdout
    pub ndjson_path: Option<PathBuf>,
    /// SQLite result store (batch mode)
    pub db_path: Option<PathBuf>,
    /// NDJSON report of rejected input records
    pub rejections_path: Option<PathBuf>,
    pub order: OutputOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Key-hash partitions for batch runs; 1 runs a single engine. Clamped to
    /// the machine's available parallelism.
    pub shards: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Batch,
            input: InputConfig::default(),
            window: WindowConfig::default(),
            output: OutputConfig::default(),
            pipeline: PipelineConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: InputFormat::Customers,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_secs: 24 * 60 * 60,
            max_live_events: Some(10_000_000),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            ndjson_path: None,
            db_path: None,
            rejections_path: None,
            order: OutputOrder::Time,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { shards: 1 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl WindowConfig {
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.window_secs.min(i64::MAX as u64 / 1000) as i64)
    }
}

impl VelocityConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        Self::try_load(path).unwrap_or_default()
    }

    /// Like [`VelocityConfig::load`], but a file that exists and fails to read
    /// or parse is an error.
    pub fn try_load(path: &std::path::Path) -> Result<Self, VelocityError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
