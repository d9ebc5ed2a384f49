//! The perpetual per-generator round loop.
//!
//! One `RoundLoop` supervises one generator, running until cancelled:
//!
//! ```text
//! loop {
//!   ├─► publish RoundStarted, reset completed/skipped
//!   ├─► for index in 0..tasks_per_round:
//!   │     ├─► mint fresh TaskId
//!   │     ├─► generate ── absent ──► warn, skipped += 1, next index
//!   │     ├─► dispatch_matrix ──► ResultSet
//!   │     ├─► aggregate::hand_off (empty set → critical)
//!   │     ├─► cleanup temp/<task-id>        (unconditional)
//!   │     └─► completed += 1, publish progress
//!   ├─► error escaping iteration ──► log with generator + task index,
//!   │                                publish RoundFailed, restart
//!   └─► round += 1                   (unconditional: a failed round never
//! }                                   re-numbers its successor)
//! ```
//!
//! ## Rules
//! - Task indices within a round are strictly sequential; task `n+1` never
//!   starts before task `n`'s cleanup completed.
//! - Cancellation is checked at safe points only (round start, each task
//!   index); in-flight subprocesses are killed by the process tree, not
//!   drained.
//! - Machine info is collected once per `run()` invocation and attached to
//!   every analysis hand-off.
//! - The loop survives isolated defects in any single task: expected
//!   failures become counters and records, everything else restarts the
//!   round.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{CompilerConfig, GeneratorConfig, GeneratorDirs};
use crate::core::{aggregate, dispatch_matrix};
use crate::error::JobError;
use crate::events::{Bus, Event, EventKind};
use crate::machine::MachineInfo;
use crate::pipeline::{AnalysisContext, GeneratedArtifact, Pipeline, TaskId};

/// How one round ended.
#[derive(Debug, PartialEq, Eq)]
enum RoundOutcome {
    /// All task indices were iterated.
    Completed,
    /// Cancellation observed at a safe point.
    Cancelled,
}

/// Supervises the unbounded round sequence for one generator.
pub struct RoundLoop {
    /// The generator this loop owns.
    pub(crate) generator: Arc<GeneratorConfig>,
    /// Shared compiler set the job matrix is built from.
    pub(crate) compilers: Arc<Vec<Arc<CompilerConfig>>>,
    /// This generator's private temp/catch directories.
    pub(crate) dirs: GeneratorDirs,
    /// Collaborator seams.
    pub(crate) pipeline: Pipeline,
    /// Event bus shared with the scheduler.
    pub(crate) bus: Bus,
    /// Fixed task count per round.
    pub(crate) tasks_per_round: usize,
    /// Soft-timeout policy, threaded unmodified to the analyzer.
    pub(crate) partial_timeout: bool,
}

impl RoundLoop {
    /// Creates a round loop for `generator`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generator: Arc<GeneratorConfig>,
        compilers: Arc<Vec<Arc<CompilerConfig>>>,
        dirs: GeneratorDirs,
        pipeline: Pipeline,
        bus: Bus,
        tasks_per_round: usize,
        partial_timeout: bool,
    ) -> Self {
        Self {
            generator,
            compilers,
            dirs,
            pipeline,
            bus,
            tasks_per_round,
            partial_timeout,
        }
    }

    /// Runs rounds until the token is cancelled.
    pub async fn run(self, token: CancellationToken) {
        let machine = MachineInfo::collect();
        let mut round: u64 = 0;

        loop {
            if token.is_cancelled() {
                break;
            }
            self.bus.publish(
                Event::new(EventKind::RoundStarted)
                    .with_generator(self.generator.name.as_str())
                    .with_round(round),
            );

            match self.run_round(round, &machine, &token).await {
                Ok(RoundOutcome::Completed) => {}
                Ok(RoundOutcome::Cancelled) => break,
                Err((index, err)) => {
                    tracing::error!(
                        generator = %self.generator.name,
                        round,
                        task_index = index,
                        error = %err,
                        "unexpected error escaped task iteration; restarting round"
                    );
                    self.bus.publish(
                        Event::new(EventKind::RoundFailed)
                            .with_generator(self.generator.name.as_str())
                            .with_round(round)
                            .with_task_index(index)
                            .with_reason(err.to_string()),
                    );
                    // A persistently failing round must not busy-spin its
                    // worker; give the scheduler a safe point before retrying.
                    tokio::task::yield_now().await;
                }
            }

            // Unconditional: a failed round never re-numbers its successor.
            round += 1;
        }
    }

    /// Iterates the fixed task count once. Errors carry the failing index.
    async fn run_round(
        &self,
        round: u64,
        machine: &MachineInfo,
        token: &CancellationToken,
    ) -> Result<RoundOutcome, (usize, JobError)> {
        let mut completed: u64 = 0;
        let mut skipped: u64 = 0;

        for index in 0..self.tasks_per_round {
            if token.is_cancelled() {
                return Ok(RoundOutcome::Cancelled);
            }

            let id = TaskId::mint();
            self.bus.publish(
                Event::new(EventKind::TaskStarted)
                    .with_generator(self.generator.name.as_str())
                    .with_round(round)
                    .with_task_index(index)
                    .with_task(id.to_string()),
            );

            let artifact = self
                .pipeline
                .generate
                .generate(id, &self.generator, &self.dirs.temp)
                .await
                .map_err(|e| (index, e))?;

            let Some(artifact) = artifact else {
                skipped += 1;
                tracing::warn!(
                    generator = %self.generator.name,
                    task_index = index,
                    "generation produced no artifact, skipping task"
                );
                self.bus.publish(
                    Event::new(EventKind::TaskSkipped)
                        .with_generator(self.generator.name.as_str())
                        .with_round(round)
                        .with_task_index(index)
                        .with_skipped(skipped),
                );
                continue;
            };

            let outcome = self.run_task(id, &artifact, machine).await;
            // Cleanup is unconditional: it runs whether aggregation
            // succeeded, the set was empty, or the task errored out.
            self.cleanup_task(id).await;
            let empty_set = outcome.map_err(|e| (index, e))?;

            // An empty set still advances the task, but counts as a skip:
            // nothing reached the analyzer.
            if empty_set {
                skipped += 1;
            }
            completed += 1;
            self.bus.publish(
                Event::new(EventKind::TaskCompleted)
                    .with_generator(self.generator.name.as_str())
                    .with_round(round)
                    .with_task_index(index)
                    .with_task(id.to_string())
                    .with_progress(completed, skipped, self.tasks_per_round),
            );
        }

        Ok(RoundOutcome::Completed)
    }

    /// Dispatches the job matrix and hands the result set to the analyzer.
    ///
    /// Returns whether the set came back empty (the hand-off reports that
    /// state itself; the caller only adjusts its skip accounting).
    async fn run_task(
        &self,
        id: TaskId,
        artifact: &GeneratedArtifact,
        machine: &MachineInfo,
    ) -> Result<bool, JobError> {
        let results = dispatch_matrix(
            &self.pipeline.toolchain,
            artifact,
            id,
            &self.generator,
            &self.compilers,
            &self.dirs.temp,
        )
        .await?;
        let empty_set = results.is_empty();

        let ctx = AnalysisContext {
            compilers: &self.compilers,
            source_dir: &artifact.source_dir,
            temp_root: &self.dirs.temp,
            catch_root: &self.dirs.catch,
            generator: &self.generator,
            id,
            seed: artifact.seed,
            results: &results,
            machine,
            partial_timeout: self.partial_timeout,
        };
        aggregate::hand_off(&self.pipeline.analyze, ctx, &self.bus).await?;
        Ok(empty_set)
    }

    /// Deletes the task-scoped temp directory. Never fails the task.
    async fn cleanup_task(&self, id: TaskId) {
        let dir = self.dirs.temp.join(id.to_string());
        if let Err(err) = tokio::fs::remove_dir_all(&dir).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(task = %id, error = %err, "task temp cleanup failed");
            }
        }
    }
}
