//! Logging subscriber: the user-visible surface of a fuzzing run.
//!
//! [`LogWriter`] renders lifecycle events through `tracing`:
//!
//! ```text
//! INFO  round 4 started generator=csmith
//! INFO  progress generator=csmith 42.00% completed skipped=1
//! WARN  generation failed generator=csmith task_index=7, skipping
//! ERROR critical: empty result set generator=csmith task=<id>
//! ```
//!
//! Routine progress is `info`, skipped generations are `warn`, aborted
//! rounds are `error`, and empty result sets are `error` with a `critical`
//! marker, matching the severity split the runtime promises.

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Tracing-backed logging subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new log writer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let generator = e.generator.as_deref().unwrap_or("?");
        match e.kind {
            EventKind::RoundStarted => {
                tracing::info!(generator, round = e.round, "fuzzing round started");
            }
            EventKind::RoundFailed => {
                tracing::error!(
                    generator,
                    round = e.round,
                    task_index = e.task_index,
                    reason = e.reason.as_deref(),
                    "round aborted by an unexpected error; restarting"
                );
            }
            EventKind::TaskStarted => {
                tracing::debug!(
                    generator,
                    round = e.round,
                    task_index = e.task_index,
                    task = e.task.as_deref(),
                    "task started"
                );
            }
            EventKind::TaskSkipped => {
                tracing::warn!(
                    generator,
                    task_index = e.task_index,
                    skipped = e.skipped,
                    "generation failed, skipping task"
                );
            }
            EventKind::TaskCompleted => {
                tracing::info!(
                    generator,
                    progress = e.progress.map(|p| format!("{p:.2}%")),
                    completed = e.completed,
                    skipped = e.skipped,
                    "task finished"
                );
            }
            EventKind::EmptyResultSet => {
                tracing::error!(
                    generator,
                    task = e.task.as_deref(),
                    "critical: empty result set for a generated artifact; dispatcher defect"
                );
            }
            EventKind::ShutdownRequested => {
                tracing::info!("shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!("all generators stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::error!("grace exceeded; force-terminating the process tree");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                tracing::warn!(reason = e.reason.as_deref(), "subscriber fault");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
