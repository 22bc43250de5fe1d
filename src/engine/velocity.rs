//! Sliding-window velocity: evict, read, insert, one event at a time.

use super::EngineState;
use crate::assembler::VelocityRecord;
use crate::config::WindowConfig;
use crate::error::VelocityError;
use crate::normalizer::Event;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Counters for one engine run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub processed: u64,
    pub evicted: u64,
    pub peak_live_events: usize,
    pub peak_distinct_keys: usize,
}

/// Owns the window state for exactly one run. Input must arrive in
/// non-decreasing time order.
pub struct VelocityEngine {
    window: Duration,
    max_live_events: Option<usize>,
    state: EngineState,
    last_time: Option<DateTime<Utc>>,
    stats: EngineStats,
}

impl VelocityEngine {
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            window: config.duration(),
            max_live_events: config.max_live_events,
            state: EngineState::new(),
            last_time: None,
            stats: EngineStats::default(),
        }
    }

    /// Engine with the given window and no capacity cap
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            max_live_events: None,
            state: EngineState::new(),
            last_time: None,
            stats: EngineStats::default(),
        }
    }

    /// Velocity for `event`, which then joins the window. `index` is the
    /// event's position in the original input.
    pub fn process<P>(
        &mut self,
        index: usize,
        event: Event<P>,
    ) -> Result<VelocityRecord<P>, VelocityError> {
        let velocity = self.observe(&event.entity_key, event.event_time, &event.event_id)?;
        Ok(VelocityRecord {
            index,
            event,
            velocity,
        })
    }

    /// Core step on the key and time alone.
    pub fn observe(
        &mut self,
        entity_key: &str,
        event_time: DateTime<Utc>,
        event_id: &str,
    ) -> Result<u64, VelocityError> {
        if let Some(previous) = self.last_time {
            if event_time < previous {
                return Err(VelocityError::UnsortedInput {
                    event_id: event_id.to_string(),
                    previous,
                    current: event_time,
                });
            }
        }

        // Entries at exactly `event_time - window` are evicted: the window is (t - w, t].
        if let Some(cutoff) = event_time.checked_sub_signed(self.window) {
            self.stats.evicted += self.state.evict_through(cutoff) as u64;
        }

        let velocity = self.state.count(entity_key);

        if let Some(limit) = self.max_live_events {
            if self.state.live_events() >= limit {
                tracing::error!(limit, event_id, "window capacity exceeded");
                return Err(VelocityError::CapacityExceeded { limit });
            }
        }
        self.state.insert(entity_key, event_time);

        self.last_time = Some(event_time);
        self.stats.processed += 1;
        self.stats.peak_live_events = self.stats.peak_live_events.max(self.state.live_events());
        self.stats.peak_distinct_keys = self.stats.peak_distinct_keys.max(self.state.distinct_keys());
        Ok(velocity)
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}
