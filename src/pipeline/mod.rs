//! Collaborator seams and the job/record data model.
//!
//! The orchestrator consumes three capabilities, each behind an async trait:
//! - [`Generate`] — turn a task identity plus a generator config into a
//!   source directory and the seed that produced it, or signal failure.
//! - [`Toolchain`] — compile, compile-and-run, and runner-execute jobs,
//!   returning structured status records (never raising for compile/run
//!   failures).
//! - [`Analyze`] — receive the full result set for one task and decide what
//!   is interesting.
//!
//! The data model ([`Job`], [`ResultRecord`], [`ResultSet`], ...) lives in
//! [`record`] and is shared by the dispatcher, the default process-backed
//! implementations in [`crate::exec`], and the analyzer hand-off.

mod analyze;
mod generate;
mod record;
mod toolchain;

pub use analyze::{Analyze, AnalysisContext};
pub use generate::{Generate, GeneratedArtifact};
pub use record::{
    CompileReport, FailureKind, Job, JobKey, PhaseStatus, ResultRecord, ResultSet, RunReport,
    RunnerRef, Seed, TaskId,
};
pub use toolchain::Toolchain;

use std::sync::Arc;

/// The three collaborator seams bundled for the round loops.
///
/// Cheap to clone; every round loop gets its own handle set.
#[derive(Clone)]
pub struct Pipeline {
    /// Test-case generation.
    pub generate: Arc<dyn Generate>,
    /// Compile/run execution primitives.
    pub toolchain: Arc<dyn Toolchain>,
    /// Result analysis and persistence.
    pub analyze: Arc<dyn Analyze>,
}

#[cfg(test)]
pub(crate) mod tests_support {
    //! Inert pipeline stubs shared by orchestration tests.

    use super::*;
    use crate::config::GeneratorConfig;
    use crate::error::JobError;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    struct NoopGenerate;

    #[async_trait]
    impl Generate for NoopGenerate {
        async fn generate(
            &self,
            _id: TaskId,
            _config: &GeneratorConfig,
            _temp_root: &Path,
        ) -> Result<Option<GeneratedArtifact>, JobError> {
            Ok(None)
        }
    }

    struct NoopToolchain;

    #[async_trait]
    impl Toolchain for NoopToolchain {
        async fn compile(&self, _job: &Job, _source_dir: &Path, _binary: &Path) -> CompileReport {
            CompileReport::success(0)
        }

        async fn compile_and_run(
            &self,
            job: Job,
            _source_dir: PathBuf,
            temp_root: PathBuf,
        ) -> Result<(JobKey, ResultRecord), JobError> {
            let binary = job.binary_path(&temp_root);
            let key = job.key(&binary);
            Ok((
                key,
                ResultRecord::completed(
                    &job,
                    CompileReport::success(0),
                    RunReport::success(0, ""),
                ),
            ))
        }

        async fn run(
            &self,
            job: Job,
            compile: CompileReport,
            binary: PathBuf,
        ) -> Result<(JobKey, ResultRecord), JobError> {
            let key = job.key(&binary);
            Ok((
                key,
                ResultRecord::completed(&job, compile, RunReport::success(0, "")),
            ))
        }
    }

    struct NoopAnalyze;

    #[async_trait]
    impl Analyze for NoopAnalyze {
        async fn analyze(&self, _ctx: AnalysisContext<'_>) -> Result<(), JobError> {
            Ok(())
        }
    }

    /// A pipeline whose seams all succeed without touching the filesystem.
    pub(crate) fn noop_pipeline() -> Pipeline {
        Pipeline {
            generate: Arc::new(NoopGenerate),
            toolchain: Arc::new(NoopToolchain),
            analyze: Arc::new(NoopAnalyze),
        }
    }
}
