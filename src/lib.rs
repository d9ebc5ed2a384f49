//! # diffuzz
//!
//! **Diffuzz** is a differential compiler-fuzzing orchestrator.
//!
//! It drives external test-case generators in perpetual rounds, builds a
//! (compiler × optimization level [× runner]) job matrix for every generated
//! program, executes the matrix concurrently, and hands the aggregated
//! result set to an analyzer that persists anything interesting. The crate
//! is designed as a building block: the generation, toolchain, and analysis
//! seams are traits, with process-backed defaults in [`exec`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  generator A │   │  generator B │   │  generator N │
//!     │  (csmith …)  │   │ (yarpgen …)  │   │              │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler (runtime orchestrator)                                 │
//! │  - Bus (broadcast events)                                         │
//! │  - ProgressTracker (per-generator counters, sequence numbers)     │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! │  - ProcessTree (registry of live process groups)                  │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  RoundLoop   │   │  RoundLoop   │   │  RoundLoop   │
//!     │ (round 0, 1…)│   │ (round 0, 1…)│   │ (round 0, 1…)│
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ per task: generate ─► dispatch_matrix ─► spawn job, job, job …
//!      │                                      ─► aggregate ─► Analyze
//!      │
//!      │ Publishes Events: RoundStarted, TaskStarted, TaskSkipped,
//!      │                   TaskCompleted, RoundFailed, EmptyResultSet
//!      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       │    (in Scheduler)      │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                     LogWriter  Progress   userN
//!                                 Tracker
//! ```
//!
//! ### Shutdown
//! ```text
//! SIGINT/SIGTERM/SIGQUIT ──► Scheduler
//!   ├─► publish ShutdownRequested
//!   ├─► cancel the shared CancellationToken
//!   ├─► wait ≤ grace for round loops (they stop at task boundaries)
//!   │     ├─ all stopped ──► AllStoppedWithin
//!   │     └─ exceeded ────► GraceExceeded{ stuck generators }
//!   └─► ProcessTree::terminate_all() kills every registered process group
//! ```
//!
//! ## Features
//! | Area             | Description                                                        | Key types / traits                        |
//! |------------------|--------------------------------------------------------------------|-------------------------------------------|
//! | **Pipeline**     | Pluggable generation, toolchain, and analysis seams.               | [`Generate`], [`Toolchain`], [`Analyze`]  |
//! | **Dispatch**     | Concurrent job matrix per task, graceful partial failure.          | [`dispatch_matrix`], [`ResultSet`]        |
//! | **Scheduling**   | One perpetual round loop per generator, signal-driven teardown.    | [`Scheduler`], [`RoundLoop`]              |
//! | **Lifecycle**    | Process-group registry and tree-wide termination.                  | [`ProcessTree`]                           |
//! | **Subscriber API**| Hook into runtime events (logging, progress, custom subscribers). | [`Subscribe`], [`SubscriberSet`]          |
//! | **Execution**    | Process-backed defaults for all three seams.                       | [`CommandGenerator`], [`CommandToolchain`], [`JsonSink`] |
//! | **Errors**       | Typed errors for orchestration and dispatch.                       | [`RuntimeError`], [`JobError`]            |
//! | **Configuration**| Runtime knobs plus the JSON compiler/generator matrix.             | [`Config`], [`ConfigFile`]                |

mod config;
mod core;
mod error;
mod events;
mod exec;
mod machine;
mod pipeline;
mod subscribers;

// ---- Public re-exports ----

pub use config::{
    CompilerConfig, Config, ConfigError, ConfigFile, Endian, GeneratorConfig, GeneratorDirs,
    LanguageSupport, OutputLayout,
};
pub use core::{dispatch_matrix, ProcessTree, RoundLoop, Scheduler};
pub use error::{JobError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use exec::{CommandGenerator, CommandToolchain, JsonSink};
pub use machine::MachineInfo;
pub use pipeline::{
    Analyze, AnalysisContext, CompileReport, FailureKind, Generate, GeneratedArtifact, Job,
    JobKey, PhaseStatus, Pipeline, ResultRecord, ResultSet, RunReport, RunnerRef, Seed, TaskId,
    Toolchain,
};
pub use subscribers::{GeneratorProgress, LogWriter, ProgressTracker, Subscribe, SubscriberSet};
