//! Compile/run execution seam.
//!
//! The orchestrator does not know toolchain invocation syntax; the
//! `Toolchain` implementation owns it. All compile and run failures are
//! returned as structured reports, never as errors: only a fault in the
//! execution machinery itself surfaces as [`JobError`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::JobError;
use crate::pipeline::{CompileReport, Job, JobKey, ResultRecord};

/// Compile/run execution primitives.
#[async_trait]
pub trait Toolchain: Send + Sync + 'static {
    /// Compiles `job`'s sources from `source_dir` into `binary`.
    ///
    /// Used for the synchronous compile-before-runners step; the report is
    /// shared by every runner job of that binary.
    async fn compile(&self, job: &Job, source_dir: &Path, binary: &Path) -> CompileReport;

    /// Compiles and, if the compile succeeds, runs the produced binary.
    ///
    /// Returns the job's key and record; a compile failure yields a record
    /// with `run = None`.
    async fn compile_and_run(
        &self,
        job: Job,
        source_dir: PathBuf,
        temp_root: PathBuf,
    ) -> Result<(JobKey, ResultRecord), JobError>;

    /// Executes an already-compiled `binary` through the job's runner.
    ///
    /// `compile` is the shared report from the synchronous compile step and
    /// must be successful; the job must carry a runner.
    async fn run(
        &self,
        job: Job,
        compile: CompileReport,
        binary: PathBuf,
    ) -> Result<(JobKey, ResultRecord), JobError>;
}
