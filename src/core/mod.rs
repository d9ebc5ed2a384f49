//! Runtime core: orchestration and lifecycle.
//!
//! The public API from this module is [`Scheduler`], [`RoundLoop`], and
//! [`ProcessTree`]; the rest is wiring.
//!
//! Internal modules:
//! - [`scheduler`]: one round-loop worker per generator, signal-driven
//!   shutdown with a grace window;
//! - [`round`]: the perpetual per-generator round loop;
//! - [`dispatch`]: builds and executes one task's job matrix concurrently;
//! - [`aggregate`]: hands a task's result set to the analyzer;
//! - [`lifecycle`]: process-group registry and tree-wide termination;
//! - [`shutdown`]: cross-platform shutdown-signal handling.
//!
//! ## Concurrency model
//! ```text
//! Scheduler ── JoinSet ──► RoundLoop (generator A) ─┐   layer 1: one worker
//!                      ──► RoundLoop (generator B) ─┤   per generator,
//!                      ──► RoundLoop (generator N) ─┘   long-lived
//!                                │
//!                                ▼ per task
//!                          dispatch_matrix ── spawn ──► job, job, job …
//!                                                       layer 2: one worker
//!                                                       per job, torn down
//!                                                       when the task ends
//! ```
//! The two layers share no mutable state; filesystem ownership is
//! partitioned by task identity. The only cross-cutting state is the
//! [`ProcessTree`], which can tear the whole tree down from any point.

mod aggregate;
mod dispatch;
mod lifecycle;
mod round;
mod scheduler;
pub(crate) mod shutdown;

pub use dispatch::dispatch_matrix;
pub use lifecycle::ProcessTree;
pub use round::RoundLoop;
pub use scheduler::Scheduler;
