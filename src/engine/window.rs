//! Live window of (time, key) entries plus the per-key count of what it holds.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
struct WindowEntry {
    event_time: DateTime<Utc>,
    entity_key: String,
}

/// Window and KeyCounter for one run. `counts[k]` always equals the number of
/// window entries keyed `k`; keys whose count drops to zero are removed.
#[derive(Debug, Default)]
pub struct EngineState {
    window: VecDeque<WindowEntry>,
    counts: HashMap<String, u64>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop every entry with `event_time <= cutoff` from the oldest end.
    /// Returns how many were evicted.
    pub fn evict_through(&mut self, cutoff: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        while let Some(front) = self.window.front() {
            if front.event_time > cutoff {
                break;
            }
            if let Some(old) = self.window.pop_front() {
                self.decrement(&old.entity_key);
                evicted += 1;
            }
        }
        evicted
    }

    fn decrement(&mut self, key: &str) {
        if let Some(c) = self.counts.get_mut(key) {
            *c -= 1;
            if *c == 0 {
                self.counts.remove(key);
            }
        }
    }

    /// Live count for `key`; absent keys count as zero.
    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Append at the newest end. Callers guarantee non-decreasing times.
    pub fn insert(&mut self, key: &str, event_time: DateTime<Utc>) {
        match self.counts.get_mut(key) {
            Some(c) => *c += 1,
            None => {
                self.counts.insert(key.to_owned(), 1);
            }
        }
        self.window.push_back(WindowEntry {
            event_time,
            entity_key: key.to_owned(),
        });
    }

    pub fn live_events(&self) -> usize {
        self.window.len()
    }

    pub fn distinct_keys(&self) -> usize {
        self.counts.len()
    }

    pub fn oldest(&self) -> Option<DateTime<Utc>> {
        self.window.front().map(|e| e.event_time)
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
