//! Configuration: runtime knobs, the compiler/generator matrix, and the
//! on-disk output layout.
//!
//! ## Contents
//! - [`Config`] — process-wide runtime settings (task count per round,
//!   timeouts, shutdown grace, bus capacity).
//! - [`GeneratorConfig`], [`CompilerConfig`], [`LanguageSupport`] — the
//!   immutable job-matrix definitions, loaded once at startup from a JSON
//!   file via [`ConfigFile`].
//! - [`Endian`] — target byte order, consumed only for compiler-set
//!   resolution.
//! - [`OutputLayout`], [`GeneratorDirs`] — per-generator temp and catch
//!   directories.
//!
//! ## Sentinel values
//! - `tasks_per_round` is a fixed per-run constant; rounds iterate exactly
//!   this many task indices.
//! - `grace = 0s` → shutdown force-terminates immediately.

mod layout;
mod matrix;

pub use layout::{GeneratorDirs, OutputLayout};
pub use matrix::{
    CompilerConfig, ConfigError, ConfigFile, Endian, GeneratorConfig, LanguageSupport,
};

use std::time::Duration;

/// Global configuration for the fuzzing runtime.
///
/// ## Field semantics
/// - `tasks_per_round`: task indices iterated per round, per generator
/// - `grace`: maximum wait for round loops to stop after a shutdown signal
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
/// - `generate_timeout` / `compile_timeout` / `run_timeout`: wall-clock
///   limits for the three subprocess phases
/// - `partial_timeout`: whether a run timeout is a soft failure (keep
///   collecting the other jobs) or a hard one; threaded unmodified to the
///   analyzer hand-off
#[derive(Clone, Debug)]
pub struct Config {
    /// Tasks iterated per round for each generator.
    pub tasks_per_round: usize,
    /// Maximum time to wait for graceful shutdown before force-terminating
    /// the process tree.
    pub grace: Duration,
    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
    /// Wall-clock limit for one generator invocation.
    pub generate_timeout: Duration,
    /// Wall-clock limit for one compile invocation.
    pub compile_timeout: Duration,
    /// Wall-clock limit for one run invocation.
    pub run_timeout: Duration,
    /// Soft-timeout policy flag, interpreted only by the analyzer.
    pub partial_timeout: bool,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `tasks_per_round = 50`
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `generate_timeout = 30s`, `compile_timeout = 60s`, `run_timeout = 10s`
    /// - `partial_timeout = true` (timeouts are soft)
    fn default() -> Self {
        Self {
            tasks_per_round: 50,
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            generate_timeout: Duration::from_secs(30),
            compile_timeout: Duration::from_secs(60),
            run_timeout: Duration::from_secs(10),
            partial_timeout: true,
        }
    }
}
