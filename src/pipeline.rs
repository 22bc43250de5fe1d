//! Batch pipeline: normalized outcomes → sort → window engine (optionally sharded) → records.

use crate::assembler::{assemble, VelocityRecord};
use crate::config::{OutputOrder, VelocityConfig, WindowConfig};
use crate::engine::{EngineStats, VelocityEngine};
use crate::error::VelocityError;
use crate::normalizer::{Event, Outcome, Rejection};
use crate::ordering::{sort_sequenced, Sequenced};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What one run saw and produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Valid plus rejected input records
    pub seen: u64,
    pub emitted: u64,
    pub rejected: u64,
    pub shards: usize,
    /// Engine counters; with several shards, peaks are the largest single-shard value
    pub engine: EngineStats,
}

impl RunSummary {
    pub(crate) fn start(shards: usize) -> (Self, Instant) {
        (
            Self {
                run_id: Uuid::new_v4(),
                started_at: Utc::now(),
                elapsed_ms: 0,
                seen: 0,
                emitted: 0,
                rejected: 0,
                shards,
                engine: EngineStats::default(),
            },
            Instant::now(),
        )
    }

    pub(crate) fn log(&self) {
        info!(
            run_id = %self.run_id,
            seen = self.seen,
            emitted = self.emitted,
            rejected = self.rejected,
            evicted = self.engine.evicted,
            peak_live_events = self.engine.peak_live_events,
            peak_distinct_keys = self.engine.peak_distinct_keys,
            elapsed_ms = self.elapsed_ms,
            "velocity run complete"
        );
    }
}

#[derive(Debug)]
pub struct RunReport<P> {
    pub records: Vec<VelocityRecord<P>>,
    pub rejections: Vec<Rejection>,
    pub summary: RunSummary,
}

pub struct BatchPipeline {
    window: WindowConfig,
    shards: usize,
    order: OutputOrder,
}

impl BatchPipeline {
    pub fn new(config: &VelocityConfig) -> Self {
        Self {
            window: config.window.clone(),
            shards: clamp_shards(config.pipeline.shards),
            order: config.output.order,
        }
    }

    /// Single engine, time-ordered output
    pub fn with_window(window: WindowConfig) -> Self {
        Self {
            window,
            shards: 1,
            order: OutputOrder::Time,
        }
    }

    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = clamp_shards(shards);
        self
    }

    pub fn order(mut self, order: OutputOrder) -> Self {
        self.order = order;
        self
    }

    /// Run over normalizer outcomes. Rejections are logged, kept, and counted;
    /// valid events are numbered in arrival order before sorting.
    pub fn run<P: Send>(
        &self,
        outcomes: impl IntoIterator<Item = Outcome<P>>,
    ) -> Result<RunReport<P>, VelocityError> {
        let (mut summary, clock) = RunSummary::start(self.shards);
        let mut valid = Vec::new();
        let mut rejections = Vec::new();

        for outcome in outcomes {
            summary.seen += 1;
            match outcome {
                Outcome::Valid(event) => valid.push(Sequenced {
                    index: valid.len(),
                    event,
                }),
                Outcome::Rejected(r) => {
                    warn!(
                        line = r.line,
                        event_id = r.event_id.as_deref().unwrap_or(""),
                        reason = %r.reason,
                        "rejected input record"
                    );
                    rejections.push(r);
                }
            }
        }
        summary.rejected = rejections.len() as u64;

        let sorted = sort_sequenced(valid);
        debug!(events = sorted.len(), "input sorted");

        let (records, engine) = self.compute(sorted)?;
        summary.emitted = records.len() as u64;
        summary.engine = engine;
        summary.elapsed_ms = clock.elapsed().as_millis() as u64;
        summary.log();

        Ok(RunReport {
            records: assemble(records, self.order),
            rejections,
            summary,
        })
    }

    /// Run over already-validated events.
    pub fn run_events<P: Send>(
        &self,
        events: impl IntoIterator<Item = Event<P>>,
    ) -> Result<RunReport<P>, VelocityError> {
        self.run(events.into_iter().map(Outcome::Valid))
    }

    fn compute<P: Send>(
        &self,
        sorted: Vec<Sequenced<P>>,
    ) -> Result<(Vec<VelocityRecord<P>>, EngineStats), VelocityError> {
        if self.shards <= 1 {
            return run_engine(&self.window, sorted);
        }

        let mut parts: Vec<Vec<Sequenced<P>>> = (0..self.shards).map(|_| Vec::new()).collect();
        for s in sorted {
            parts[shard_for(&s.event.entity_key, self.shards)].push(s);
        }

        let window = &self.window;
        let results = std::thread::scope(|scope| {
            let handles: Vec<_> = parts
                .into_iter()
                .map(|part| scope.spawn(move || run_engine(window, part)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().map_err(|_| VelocityError::WorkerPanicked)?)
                .collect::<Result<Vec<_>, VelocityError>>()
        })?;

        let mut stats = EngineStats::default();
        let mut records = Vec::new();
        for (shard_records, s) in results {
            stats.processed += s.processed;
            stats.evicted += s.evicted;
            stats.peak_live_events = stats.peak_live_events.max(s.peak_live_events);
            stats.peak_distinct_keys = stats.peak_distinct_keys.max(s.peak_distinct_keys);
            records.extend(shard_records);
        }
        // Same order a single engine would have produced
        records.sort_by_key(|r| (r.event.event_time, r.index));
        Ok((records, stats))
    }
}

fn run_engine<P>(
    window: &WindowConfig,
    sorted: Vec<Sequenced<P>>,
) -> Result<(Vec<VelocityRecord<P>>, EngineStats), VelocityError> {
    let mut engine = VelocityEngine::new(window);
    let mut out = Vec::with_capacity(sorted.len());
    for s in sorted {
        out.push(engine.process(s.index, s.event)?);
    }
    Ok((out, engine.stats()))
}

/// At least one shard, at most one per available core.
fn clamp_shards(requested: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let shards = requested.clamp(1, cores);
    if shards < requested {
        debug!(requested, shards, "shard count clamped to available parallelism");
    }
    shards
}

/// Every event of a key lands in the same shard.
fn shard_for(key: &str, shards: usize) -> usize {
    let mut h = DefaultHasher::new();
    key.hash(&mut h);
    (h.finish() % shards as u64) as usize
}
