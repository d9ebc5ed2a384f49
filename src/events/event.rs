//! Runtime events emitted by the scheduler and the per-generator round loops.
//!
//! [`EventKind`] classifies events across three categories:
//! - **Round/task lifecycle**: the fuzzing flow (round announcements, task
//!   progress, skips).
//! - **Consistency violations**: states that indicate an orchestrator defect
//!   rather than a failure of the program under test.
//! - **Shutdown**: the interrupt path and its outcome.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    SubscriberPanicked,
    /// Subscriber dropped an event (queue full or worker closed).
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,
    /// All round loops stopped within the configured grace period.
    AllStoppedWithin,
    /// Grace period exceeded; the process tree is being force-terminated.
    GraceExceeded,

    // === Round/task lifecycle events ===
    /// A generator begins a new fuzzing round.
    ///
    /// Sets: `generator`, `round`.
    RoundStarted,
    /// A round was aborted by an error escaping task iteration. The next
    /// round still gets a fresh number.
    ///
    /// Sets: `generator`, `round`, `task_index`, `reason`.
    RoundFailed,
    /// One task iteration begins.
    ///
    /// Sets: `generator`, `round`, `task_index`, `task`.
    TaskStarted,
    /// Generation produced no artifact; the task index was skipped.
    ///
    /// Sets: `generator`, `round`, `task_index`, `skipped`.
    TaskSkipped,
    /// One task finished dispatch, aggregation, and cleanup.
    ///
    /// Sets: `generator`, `round`, `task_index`, `task`, `completed`,
    /// `skipped`, `progress`.
    TaskCompleted,

    // === Consistency violations ===
    /// A valid generated artifact produced an empty result set. This is a
    /// dispatcher defect, never a legitimate outcome.
    ///
    /// Sets: `generator`, `task`.
    EmptyResultSet,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Generator name, if applicable.
    pub generator: Option<Arc<str>>,
    /// Round number within the generator's loop.
    pub round: Option<u64>,
    /// Task index within the round.
    pub task_index: Option<usize>,
    /// Task identity, rendered.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Completed-task count for the current round.
    pub completed: Option<u64>,
    /// Skipped-task count for the current round.
    pub skipped: Option<u64>,
    /// Round progress in percent.
    pub progress: Option<f64>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            generator: None,
            round: None,
            task_index: None,
            task: None,
            reason: None,
            completed: None,
            skipped: None,
            progress: None,
        }
    }

    /// Attaches the generator name.
    #[inline]
    pub fn with_generator(mut self, generator: impl Into<Arc<str>>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    /// Attaches the round number.
    #[inline]
    pub fn with_round(mut self, round: u64) -> Self {
        self.round = Some(round);
        self
    }

    /// Attaches the task index within the round.
    #[inline]
    pub fn with_task_index(mut self, index: usize) -> Self {
        self.task_index = Some(index);
        self
    }

    /// Attaches the task identity.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches round counters and the derived progress percentage.
    #[inline]
    pub fn with_progress(mut self, completed: u64, skipped: u64, total: usize) -> Self {
        self.completed = Some(completed);
        self.skipped = Some(skipped);
        self.progress = Some(if total == 0 {
            100.0
        } else {
            completed as f64 / total as f64 * 100.0
        });
        self
    }

    /// Attaches only the skipped counter (for skip events).
    #[inline]
    pub fn with_skipped(mut self, skipped: u64) -> Self {
        self.skipped = Some(skipped);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}
