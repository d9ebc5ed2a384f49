//! The job and result data model.
//!
//! One generated program fans out into a set of [`Job`]s, one per
//! (compiler, optimization level\[, runner\]) combination. Every dispatched
//! job produces exactly one [`ResultRecord`], keyed into the task's
//! [`ResultSet`] by its [`JobKey`].
//!
//! ## Invariants
//! - `run` is `None` whenever `compile` failed; the constructors enforce it.
//! - Job keys are unique within a task: the key is the binary path, with a
//!   runner suffix for runner jobs (two runners of the same binary never
//!   collide).
//! - Task identities are minted fresh per task and never reused.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::config::CompilerConfig;

/// Unique identity of one generate → dispatch → aggregate → cleanup cycle.
///
/// Namespaces the task's temp directory and correlates all jobs and result
/// records belonging to one generated program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Mints a fresh identity. Never reused.
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The random seed a generation used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Seed(pub u64);

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Key identifying one job's record within a task's result set.
pub type JobKey = String;

/// An alternate execution environment for a compiled artifact.
#[derive(Clone, Debug)]
pub struct RunnerRef {
    /// Runner name from the language descriptor.
    pub name: String,
    /// Command that executes the binary.
    pub command: String,
}

/// One unit of compile(+run) work.
///
/// Ephemeral; exists only for the duration of one dispatch.
#[derive(Clone)]
pub struct Job {
    /// Task this job belongs to.
    pub id: TaskId,
    /// Seed of the generated program.
    pub seed: Seed,
    /// Generator name, for the result record.
    pub generator: Arc<str>,
    /// Compiler configuration.
    pub compiler: Arc<CompilerConfig>,
    /// Optimization-level flag for this job.
    pub opt_level: String,
    /// Runner, when the compiled output needs one.
    pub runner: Option<RunnerRef>,
}

impl Job {
    /// Returns a copy of this job bound to the given runner.
    pub fn with_runner(&self, name: &str, command: &str) -> Self {
        let mut job = self.clone();
        job.runner = Some(RunnerRef {
            name: name.to_string(),
            command: command.to_string(),
        });
        job
    }

    /// Path of the binary this job produces under the generator temp root:
    /// `<temp>/<task-id>/<stem>_<opt>` with the flag's leading dash trimmed.
    pub fn binary_path(&self, temp_root: &Path) -> PathBuf {
        let opt = self.opt_level.trim_start_matches('-');
        temp_root
            .join(self.id.to_string())
            .join(format!("{}_{}", self.compiler.file_stem, opt))
    }

    /// Unique key for this job's result record.
    ///
    /// Runner jobs append the runner name so that runners sharing one
    /// binary never collide.
    pub fn key(&self, binary: &Path) -> JobKey {
        match &self.runner {
            Some(runner) => format!("{}:{}", binary.display(), runner.name),
            None => binary.display().to_string(),
        }
    }
}

/// Outcome classification of one phase (compile or run).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    /// The phase completed with exit code zero.
    Success,
    /// The phase failed; `error_kind` says how.
    Failure,
}

/// How a phase failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The process could not be spawned at all.
    Spawn,
    /// Non-zero exit code.
    NonZeroExit,
    /// Terminated by a signal (covers crashes such as SIGSEGV).
    Signal,
    /// Exceeded the wall-clock limit and was killed.
    Timeout,
}

/// Structured outcome of one compile invocation.
#[derive(Clone, Debug, Serialize)]
pub struct CompileReport {
    /// Success or failure.
    pub status: PhaseStatus,
    /// Process exit code, when one was observed.
    pub return_code: Option<i32>,
    /// Failure classification, `None` on success.
    pub error_kind: Option<FailureKind>,
    /// Failure detail (stderr excerpt, spawn error), `None` on success.
    pub error_message: Option<String>,
}

impl CompileReport {
    /// A successful compile.
    pub fn success(return_code: i32) -> Self {
        Self {
            status: PhaseStatus::Success,
            return_code: Some(return_code),
            error_kind: None,
            error_message: None,
        }
    }

    /// A failed compile.
    pub fn failure(kind: FailureKind, return_code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            status: PhaseStatus::Failure,
            return_code,
            error_kind: Some(kind),
            error_message: Some(message.into()),
        }
    }

    /// True when the compile succeeded.
    pub fn ok(&self) -> bool {
        self.status == PhaseStatus::Success
    }
}

/// Structured outcome of one run invocation.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// Success or failure.
    pub status: PhaseStatus,
    /// Process exit code, when one was observed.
    pub return_code: Option<i32>,
    /// Failure classification, `None` on success.
    pub error_kind: Option<FailureKind>,
    /// Failure detail, `None` on success.
    pub error_message: Option<String>,
    /// Observable output of the executed program (the differential signal).
    pub output: Option<String>,
}

impl RunReport {
    /// A successful run with its observable output.
    pub fn success(return_code: i32, output: impl Into<String>) -> Self {
        Self {
            status: PhaseStatus::Success,
            return_code: Some(return_code),
            error_kind: None,
            error_message: None,
            output: Some(output.into()),
        }
    }

    /// A failed run.
    pub fn failure(kind: FailureKind, return_code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            status: PhaseStatus::Failure,
            return_code,
            error_kind: Some(kind),
            error_message: Some(message.into()),
            output: None,
        }
    }
}

/// The outcome of one job.
///
/// Constructed only through [`ResultRecord::completed`] and
/// [`ResultRecord::compile_failed`], which keep the compile/run invariant.
#[derive(Clone, Debug, Serialize)]
pub struct ResultRecord {
    /// Task this record belongs to.
    pub id: TaskId,
    /// Seed of the generated program.
    pub seed: Seed,
    /// Compiler name.
    pub compiler: String,
    /// Optimization-level flag.
    pub opt_level: String,
    /// Generator name.
    pub generator: String,
    /// Compile outcome.
    pub compile: CompileReport,
    /// Run outcome; `None` whenever the compile failed.
    pub run: Option<RunReport>,
}

impl ResultRecord {
    /// Record for a job whose compile succeeded and whose run finished
    /// (successfully or not).
    pub fn completed(job: &Job, compile: CompileReport, run: RunReport) -> Self {
        debug_assert!(compile.ok(), "completed record requires a successful compile");
        Self {
            id: job.id,
            seed: job.seed,
            compiler: job.compiler.name.clone(),
            opt_level: job.opt_level.clone(),
            generator: job.generator.to_string(),
            compile,
            run: Some(run),
        }
    }

    /// Record for a job whose compile failed; the run never happens.
    pub fn compile_failed(job: &Job, compile: CompileReport) -> Self {
        Self {
            id: job.id,
            seed: job.seed,
            compiler: job.compiler.name.clone(),
            opt_level: job.opt_level.clone(),
            generator: job.generator.to_string(),
            compile,
            run: None,
        }
    }
}

/// All result records for one task, keyed by job identity.
///
/// Insertion order is irrelevant; keys are unique per task.
pub type ResultSet = BTreeMap<JobKey, ResultRecord>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    fn compiler(stem: &str) -> Arc<CompilerConfig> {
        Arc::new(CompilerConfig {
            name: stem.to_string(),
            executable: stem.to_string(),
            file_stem: stem.to_string(),
            opt_levels: vec!["-O0".into()],
            languages: Map::new(),
        })
    }

    fn job() -> Job {
        Job {
            id: TaskId::mint(),
            seed: Seed(42),
            generator: "csmith".into(),
            compiler: compiler("gcc"),
            opt_level: "-O2".into(),
            runner: None,
        }
    }

    #[test]
    fn task_ids_are_pairwise_distinct() {
        let ids: Vec<TaskId> = (0..64).map(|_| TaskId::mint()).collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn binary_path_trims_the_flag_dash() {
        let job = job();
        let path = job.binary_path(Path::new("/tmp/t"));
        assert!(path.ends_with(format!("{}/gcc_O2", job.id)));
    }

    #[test]
    fn runner_keys_do_not_collide() {
        let base = job();
        let binary = base.binary_path(Path::new("/tmp/t"));
        let a = base.with_runner("node", "node").key(&binary);
        let b = base.with_runner("wasmtime", "wasmtime run").key(&binary);
        assert_ne!(a, b);
        assert!(a.ends_with(":node"));
    }

    #[test]
    fn compile_failure_never_carries_a_run() {
        let record = ResultRecord::compile_failed(
            &job(),
            CompileReport::failure(FailureKind::Timeout, None, "timed out"),
        );
        assert!(record.run.is_none());
        assert_eq!(record.compile.error_kind, Some(FailureKind::Timeout));
    }

    #[test]
    fn records_serialize_with_nested_reports() {
        let record = ResultRecord::completed(
            &job(),
            CompileReport::success(0),
            RunReport::success(0, "checksum = 1234"),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["compile"]["status"], "success");
        assert_eq!(json["run"]["output"], "checksum = 1234");
    }
}
