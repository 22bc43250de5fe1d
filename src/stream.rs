//! Online mode: consume a lazy, time-ordered outcome stream and emit each record
//! as soon as its velocity is known. Nothing is buffered, so stopping early
//! leaves nothing to flush.

use crate::assembler::VelocityRecord;
use crate::config::WindowConfig;
use crate::engine::VelocityEngine;
use crate::error::VelocityError;
use crate::normalizer::{Outcome, Rejection};
use crate::pipeline::RunSummary;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub struct StreamRunner {
    engine: VelocityEngine,
    stop: Arc<AtomicBool>,
}

impl StreamRunner {
    pub fn new(window: &WindowConfig, stop: Arc<AtomicBool>) -> Self {
        Self {
            engine: VelocityEngine::new(window),
            stop,
        }
    }

    /// Drive the engine until the input ends or a stop is requested.
    /// `emit` receives each record; `reject` each rejected input record.
    /// An out-of-order event ends the run with `UnsortedInput`.
    pub fn run<P, I, E, R>(
        &mut self,
        input: I,
        mut emit: E,
        mut reject: R,
    ) -> Result<RunSummary, VelocityError>
    where
        I: IntoIterator<Item = std::io::Result<Outcome<P>>>,
        E: FnMut(VelocityRecord<P>) -> Result<(), VelocityError>,
        R: FnMut(&Rejection) -> Result<(), VelocityError>,
    {
        let (mut summary, clock) = RunSummary::start(1);
        let mut index = 0usize;

        for item in input {
            if self.stop.load(Ordering::Relaxed) {
                info!(seen = summary.seen, "stop requested; ending stream");
                break;
            }
            summary.seen += 1;
            match item? {
                Outcome::Valid(event) => {
                    let record = self.engine.process(index, event)?;
                    index += 1;
                    emit(record)?;
                    summary.emitted += 1;
                }
                Outcome::Rejected(r) => {
                    warn!(
                        line = r.line,
                        event_id = r.event_id.as_deref().unwrap_or(""),
                        reason = %r.reason,
                        "rejected input record"
                    );
                    reject(&r)?;
                    summary.rejected += 1;
                }
            }
        }

        summary.engine = self.engine.stats();
        summary.elapsed_ms = clock.elapsed().as_millis() as u64;
        summary.log();
        Ok(summary)
    }
}
