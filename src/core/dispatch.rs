//! Task matrix dispatcher: builds and executes one task's job set.
//!
//! For one generated program, every (compiler, optimization level\[, runner\])
//! combination becomes one submission:
//!
//! ```text
//! for compiler, for opt_level:
//!   no runners   ──► Scheduled(compile_and_run)            concurrent
//!   runners:
//!     compile once, synchronously (runners share the binary)
//!       ├─ ok     ──► Scheduled(run via runner) × runners   concurrent
//!       └─ failed ──► Synthesized(record, run = None) × runners   inline
//! ```
//!
//! Submissions are collected in enumeration order as a sum type before any
//! outcome is awaited; the concurrent pool is scoped to this call (fresh
//! spawn handles, all awaited before return), so no job is ever left pending
//! when the result set is handed back.
//!
//! ## Failure handling
//! - Compile and run failures are data inside the records, never errors.
//! - A job outcome carrying a [`JobError`] (a fault in the machinery, not in
//!   the program under test) is logged and dropped, not recorded.
//! - Only faults of the dispatch machinery itself (worker join failure,
//!   missing language descriptor) propagate to the caller.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{CompilerConfig, GeneratorConfig};
use crate::error::JobError;
use crate::pipeline::{
    GeneratedArtifact, Job, JobKey, ResultRecord, ResultSet, TaskId, Toolchain,
};

/// One unit of the matrix: either scheduled for concurrent execution or
/// synthesized inline at submit time.
enum Submission {
    Scheduled(JoinHandle<Result<(JobKey, ResultRecord), JobError>>),
    Synthesized(JobKey, ResultRecord),
}

/// Executes the full job matrix for one task and collects the result set.
///
/// Returns only after every job has either completed or been synthesized.
pub async fn dispatch_matrix(
    toolchain: &Arc<dyn Toolchain>,
    artifact: &GeneratedArtifact,
    id: TaskId,
    generator: &GeneratorConfig,
    compilers: &[Arc<CompilerConfig>],
    temp_root: &Path,
) -> Result<ResultSet, JobError> {
    let mut submissions: Vec<Submission> = Vec::new();
    let generator_name: Arc<str> = generator.name.as_str().into();

    for compiler in compilers {
        let support = compiler.support(&generator.language).ok_or_else(|| {
            JobError::UnsupportedLanguage {
                compiler: compiler.name.clone(),
                language: generator.language.clone(),
            }
        })?;

        for opt_level in &compiler.opt_levels {
            let job = Job {
                id,
                seed: artifact.seed,
                generator: Arc::clone(&generator_name),
                compiler: Arc::clone(compiler),
                opt_level: opt_level.clone(),
                runner: None,
            };

            match &support.runners {
                None => {
                    let tc = Arc::clone(toolchain);
                    let source_dir = artifact.source_dir.clone();
                    let temp_root = temp_root.to_path_buf();
                    submissions.push(Submission::Scheduled(tokio::spawn(async move {
                        tc.compile_and_run(job, source_dir, temp_root).await
                    })));
                }
                Some(runners) => {
                    // Runners consume the same compiled artifact, so the
                    // compile happens once, before any run is scheduled.
                    let binary = job.binary_path(temp_root);
                    let compile = toolchain.compile(&job, &artifact.source_dir, &binary).await;

                    if compile.ok() {
                        for (name, command) in runners {
                            let runner_job = job.with_runner(name, command);
                            let tc = Arc::clone(toolchain);
                            let compile = compile.clone();
                            let binary = binary.clone();
                            submissions.push(Submission::Scheduled(tokio::spawn(async move {
                                tc.run(runner_job, compile, binary).await
                            })));
                        }
                    } else {
                        for (name, command) in runners {
                            let runner_job = job.with_runner(name, command);
                            let key = runner_job.key(&binary);
                            submissions.push(Submission::Synthesized(
                                key,
                                ResultRecord::compile_failed(&runner_job, compile.clone()),
                            ));
                        }
                    }
                }
            }
        }
    }

    collect(submissions).await
}

/// Awaits every scheduled submission and merges all outcomes into one set.
///
/// A join failure still drains every remaining scheduled handle (abort and
/// await) before the error is returned: the caller deletes the task's temp
/// directory next, and no job may be running under it by then.
async fn collect(submissions: Vec<Submission>) -> Result<ResultSet, JobError> {
    let mut results = ResultSet::new();
    let mut join_failure: Option<JobError> = None;

    for submission in submissions {
        match submission {
            Submission::Synthesized(key, record) => {
                results.insert(key, record);
            }
            Submission::Scheduled(handle) => {
                if join_failure.is_some() {
                    handle.abort();
                    let _ = handle.await;
                    continue;
                }
                match handle.await {
                    Err(join_err) => {
                        join_failure = Some(JobError::Join {
                            message: join_err.to_string(),
                        });
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(
                            error = %err,
                            label = err.as_label(),
                            "dropping job outcome after a dispatch-side fault"
                        );
                    }
                    Ok(Ok((key, record))) => {
                        results.insert(key, record);
                    }
                }
            }
        }
    }

    match join_failure {
        Some(err) => Err(err),
        None => Ok(results),
    }
}
