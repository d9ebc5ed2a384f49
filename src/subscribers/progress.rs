//! Per-generator progress tracker with sequence-based ordering.
//!
//! Maintains the latest round/task counters for every generator, using
//! event sequence numbers to reject out-of-order delivery. The scheduler
//! reads a snapshot when the shutdown grace period is exceeded, to name the
//! generators that were still running.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Latest observed state for one generator.
#[derive(Debug, Clone, Default)]
pub struct GeneratorProgress {
    /// Last seen sequence number, for staleness checks.
    pub last_seq: u64,
    /// Current round number.
    pub round: u64,
    /// Completed tasks in the current round.
    pub completed: u64,
    /// Skipped tasks in the current round.
    pub skipped: u64,
}

/// Thread-safe tracker of per-generator progress.
///
/// Events with `seq <= last_seq` for a generator are rejected as stale, so
/// fan-out reordering cannot roll counters backwards.
#[derive(Default)]
pub struct ProgressTracker {
    state: RwLock<HashMap<String, GeneratorProgress>>,
}

impl ProgressTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, ev: &Event) {
        let Some(generator) = ev.generator.as_deref() else {
            return;
        };
        let mut state = self.state.write().expect("progress tracker poisoned");
        let entry = state.entry(generator.to_string()).or_default();
        if ev.seq <= entry.last_seq && entry.last_seq != 0 {
            return;
        }
        entry.last_seq = ev.seq;

        match ev.kind {
            EventKind::RoundStarted => {
                if let Some(round) = ev.round {
                    entry.round = round;
                }
                entry.completed = 0;
                entry.skipped = 0;
            }
            EventKind::TaskCompleted | EventKind::TaskSkipped => {
                if let Some(completed) = ev.completed {
                    entry.completed = completed;
                }
                if let Some(skipped) = ev.skipped {
                    entry.skipped = skipped;
                }
            }
            _ => {}
        }
    }

    /// Returns the sorted list of generators seen so far.
    ///
    /// Used by the scheduler to report which generators were still running
    /// when the shutdown grace period ran out.
    pub fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().expect("progress tracker poisoned");
        let mut names: Vec<String> = state.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the progress record for one generator, if any.
    pub fn progress_of(&self, generator: &str) -> Option<GeneratorProgress> {
        let state = self.state.read().expect("progress tracker poisoned");
        state.get(generator).cloned()
    }
}

#[async_trait]
impl Subscribe for ProgressTracker {
    async fn on_event(&self, event: &Event) {
        self.update(event);
    }

    fn name(&self) -> &'static str {
        "progress"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_start_resets_counters() {
        let tracker = ProgressTracker::new();
        tracker.update(
            &Event::new(EventKind::TaskCompleted)
                .with_generator("csmith")
                .with_progress(5, 2, 10),
        );
        tracker.update(
            &Event::new(EventKind::RoundStarted)
                .with_generator("csmith")
                .with_round(1),
        );

        let p = tracker.progress_of("csmith").unwrap();
        assert_eq!(p.round, 1);
        assert_eq!(p.completed, 0);
        assert_eq!(p.skipped, 0);
    }

    #[test]
    fn stale_events_are_rejected() {
        let tracker = ProgressTracker::new();
        let newer = Event::new(EventKind::TaskCompleted)
            .with_generator("g")
            .with_progress(9, 0, 10);
        let older = Event::new(EventKind::TaskCompleted)
            .with_generator("g")
            .with_progress(1, 0, 10);

        // Apply out of order: the stale event must not roll counters back.
        let mut stale = older;
        stale.seq = 0;
        tracker.update(&newer);
        tracker.update(&stale);

        assert_eq!(tracker.progress_of("g").unwrap().completed, 9);
    }

    #[test]
    fn snapshot_is_sorted() {
        let tracker = ProgressTracker::new();
        tracker.update(&Event::new(EventKind::RoundStarted).with_generator("yarpgen"));
        tracker.update(&Event::new(EventKind::RoundStarted).with_generator("csmith"));
        assert_eq!(tracker.snapshot(), vec!["csmith", "yarpgen"]);
    }
}
