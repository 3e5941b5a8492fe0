//! Per-election debounce gate.
//!
//! Admits at most one trigger per election within the debounce window.
//! Suppressed events are dropped, not queued. State lives only in memory
//! and grows by one entry per distinct election seen.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::constants::DEFAULT_DEBOUNCE_WINDOW;
use crate::events::ElectionId;

/// Source of wall-clock milliseconds for the gate.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Time-based admission gate keyed by election.
///
/// The check-and-record runs under the map's entry lock, so two callers
/// racing on the same election cannot both be admitted.
pub struct DebounceGate {
    window_millis: i64,
    last_triggered: DashMap<ElectionId, i64>,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window_millis: window.as_millis().min(i64::MAX as u128) as i64,
            last_triggered: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_millis as u64)
    }

    /// Returns true, and records `now_millis`, iff at least one window has
    /// elapsed since the last admitted trigger for `election_id`. An election
    /// never seen before is always admitted.
    pub fn should_trigger(&self, election_id: &ElectionId, now_millis: i64) -> bool {
        match self.last_triggered.entry(election_id.clone()) {
            Entry::Occupied(mut entry) => {
                if now_millis.saturating_sub(*entry.get()) >= self.window_millis {
                    entry.insert(now_millis);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now_millis);
                true
            }
        }
    }

    /// Last admitted trigger time for `election_id`, if any.
    pub fn last_triggered(&self, election_id: &ElectionId) -> Option<i64> {
        self.last_triggered.get(election_id).map(|entry| *entry)
    }

    /// Number of distinct elections tracked.
    pub fn tracked(&self) -> usize {
        self.last_triggered.len()
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}
