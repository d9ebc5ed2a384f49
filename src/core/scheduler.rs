//! Top-level scheduler: one round-loop worker per generator, signal-driven
//! teardown with a grace window.
//!
//! ```text
//!                   ┌──────── Bus ────────┐
//!                   │                     ▼
//! Scheduler ──► RoundLoop ×N        subscriber listener ──► SubscriberSet
//!     │             ▲                                        (log, progress, …)
//!     │             │ child CancellationToken
//!     └── select! ──┤
//!            │      └── all workers finished        ──► normal return
//!            └──────── shutdown signal ──► cancel ──► wait ≤ grace
//!                                                       │
//!                                          within grace ─► AllStoppedWithin
//!                                          exceeded ─────► GraceExceeded,
//!                                                          terminate tree
//! ```
//!
//! ## Rules
//! - Round loops never outlive the scheduler: whichever way `run()` exits,
//!   the process tree is terminated (idempotent).
//! - A [`ProgressTracker`] is always part of the subscriber set; it names
//!   the stuck generators when the grace window runs out.
//! - Workers check cancellation at safe points; anything still inside a
//!   subprocess when the grace expires dies with the process tree.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::{CompilerConfig, Config, GeneratorConfig, OutputLayout};
use crate::core::shutdown::wait_for_shutdown_signal;
use crate::core::{ProcessTree, RoundLoop};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::pipeline::Pipeline;
use crate::subscribers::{ProgressTracker, Subscribe, SubscriberSet};

/// Owns the generator workers and the shutdown sequence.
pub struct Scheduler {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    progress: Arc<ProgressTracker>,
    tree: Arc<ProcessTree>,
}

impl Scheduler {
    /// Creates a scheduler with the given subscribers.
    ///
    /// A [`ProgressTracker`] is appended to the set unconditionally; callers
    /// pass only their own subscribers (loggers, sinks).
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>, tree: Arc<ProcessTree>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let progress = Arc::new(ProgressTracker::new());

        let mut subs = subscribers;
        subs.push(progress.clone() as Arc<dyn Subscribe>);
        let subs = Arc::new(SubscriberSet::new(subs, bus.clone()));

        Self {
            cfg,
            bus,
            subs,
            progress,
            tree,
        }
    }

    /// The shared event bus, for callers that want their own receiver.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs one round loop per generator until a shutdown signal arrives or
    /// every worker returns on its own.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] when workers did not stop
    /// within the grace window after a signal; the process tree is
    /// force-terminated either way.
    pub async fn run(
        &self,
        generators: Vec<Arc<GeneratorConfig>>,
        compilers: Arc<Vec<Arc<CompilerConfig>>>,
        layout: &OutputLayout,
        pipeline: Pipeline,
    ) -> Result<(), RuntimeError> {
        let _listener = self.spawn_subscriber_listener();

        let token = CancellationToken::new();
        let mut workers = JoinSet::new();

        for generator in generators {
            let dirs = layout.for_generator(&generator.name);
            let round_loop = RoundLoop::new(
                generator,
                compilers.clone(),
                dirs,
                pipeline.clone(),
                self.bus.clone(),
                self.cfg.tasks_per_round,
                self.cfg.partial_timeout,
            );
            workers.spawn(round_loop.run(token.child_token()));
        }

        let result = self.drive(&mut workers, &token).await;
        // Idempotent: a no-op on the normal path, the backstop otherwise.
        self.tree.terminate_all();
        result
    }

    /// Pumps bus events into the subscriber set until the bus closes.
    fn spawn_subscriber_listener(&self) -> tokio::task::JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let subs = self.subs.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => subs.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "subscriber listener lagged behind the bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Waits for either natural completion or a shutdown signal.
    async fn drive(
        &self,
        workers: &mut JoinSet<()>,
        token: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        tokio::select! {
            _ = Self::join_all(workers) => return Ok(()),
            _ = wait_for_shutdown_signal() => {}
        }
        tracing::info!("shutdown signal received, cancelling generator workers");
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        token.cancel();
        self.wait_all_with_grace(workers).await
    }

    /// Awaits all workers, bounded by the configured grace.
    async fn wait_all_with_grace(&self, workers: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        match tokio::time::timeout(self.cfg.grace, Self::join_all(workers)).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self.progress.snapshot();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_reason(format!("stuck generators: {stuck:?}")),
                );
                Err(RuntimeError::GraceExceeded {
                    grace: self.cfg.grace,
                    stuck,
                })
            }
        }
    }

    async fn join_all(workers: &mut JoinSet<()>) {
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "generator worker failed to join");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn run_with_no_generators_returns_immediately() {
        let scheduler = Scheduler::new(Config::default(), vec![], Arc::new(ProcessTree::new()));

        let base = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(base.path());
        let pipeline = crate::pipeline::tests_support::noop_pipeline();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            scheduler.run(vec![], Arc::new(vec![]), &layout, pipeline),
        )
        .await
        .expect("scheduler hung with zero workers");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn grace_exceeded_names_active_generators() {
        let mut cfg = Config::default();
        cfg.grace = Duration::from_millis(10);
        let scheduler = Scheduler::new(cfg, vec![], Arc::new(ProcessTree::new()));

        scheduler.subs.emit(
            &Event::new(EventKind::RoundStarted)
                .with_generator("yarpgen")
                .with_round(3),
        );
        // Let the progress worker drain its queue.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut workers = JoinSet::new();
        workers.spawn(async {
            // Ignores cancellation on purpose.
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let err = scheduler
            .wait_all_with_grace(&mut workers)
            .await
            .expect_err("grace should have been exceeded");
        match err {
            RuntimeError::GraceExceeded { stuck, .. } => {
                assert_eq!(stuck, vec!["yarpgen".to_string()]);
            }
        }
        workers.abort_all();
    }
}
