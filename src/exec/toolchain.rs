//! Process-backed [`Toolchain`] implementation.
//!
//! Invokes real compiler and runner executables through
//! [`run_captured`](super::command::run_captured), classifies their
//! outcomes, and never raises for a compile or run failure: those become
//! structured reports inside the result record.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::core::ProcessTree;
use crate::error::JobError;
use crate::pipeline::{
    CompileReport, FailureKind, Job, JobKey, ResultRecord, RunReport, Toolchain,
};

use super::command::{run_captured, Captured, Invocation};

/// Longest stderr excerpt carried into a report.
const STDERR_EXCERPT: usize = 4096;

/// Toolchain that shells out to the configured compiler executables.
pub struct CommandToolchain {
    tree: Arc<ProcessTree>,
    compile_timeout: Duration,
    run_timeout: Duration,
}

impl CommandToolchain {
    /// Creates a toolchain bound to the process tree for cleanup.
    pub fn new(tree: Arc<ProcessTree>, cfg: &Config) -> Self {
        Self {
            tree,
            compile_timeout: cfg.compile_timeout,
            run_timeout: cfg.run_timeout,
        }
    }

    /// Lists the source files in the task directory, sorted for stable
    /// command lines.
    async fn source_files(&self, source_dir: &Path) -> Result<Vec<PathBuf>, JobError> {
        let mut sources = Vec::new();
        let mut entries = tokio::fs::read_dir(source_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                sources.push(entry.path());
            }
        }
        sources.sort();
        Ok(sources)
    }

    fn classify(captured: &Captured) -> (FailureKind, String) {
        if let Some(spawn) = &captured.spawn_error {
            return (FailureKind::Spawn, spawn.clone());
        }
        if captured.timed_out {
            return (FailureKind::Timeout, "wall-clock limit exceeded".into());
        }
        if captured.signal.is_some() {
            return (
                FailureKind::Signal,
                format!("terminated by signal {:?}", captured.signal),
            );
        }
        let mut excerpt = captured.stderr.clone();
        excerpt.truncate(STDERR_EXCERPT);
        (FailureKind::NonZeroExit, excerpt)
    }

    async fn compile_inner(
        &self,
        job: &Job,
        source_dir: &Path,
        binary: &Path,
    ) -> Result<CompileReport, JobError> {
        let sources = self.source_files(source_dir).await?;
        let mut args = vec![job.opt_level.clone()];
        args.extend(sources.iter().map(|p| p.display().to_string()));
        args.push("-o".into());
        args.push(binary.display().to_string());

        let captured = run_captured(
            &self.tree,
            &Invocation {
                program: job.compiler.executable.clone(),
                args,
                cwd: None,
                timeout: self.compile_timeout,
            },
        )
        .await;

        if captured.success() {
            Ok(CompileReport::success(0))
        } else {
            let (kind, message) = Self::classify(&captured);
            Ok(CompileReport::failure(kind, captured.code, message))
        }
    }

    async fn run_inner(&self, job: &Job, binary: &Path) -> RunReport {
        // A runner command is a program plus leading arguments, with the
        // binary path appended last.
        let (program, mut args) = match &job.runner {
            Some(runner) => {
                let mut parts = runner.command.split_whitespace();
                let program = parts.next().unwrap_or(runner.command.as_str()).to_string();
                let args: Vec<String> = parts.map(str::to_string).collect();
                (program, args)
            }
            None => (binary.display().to_string(), vec![]),
        };
        if job.runner.is_some() {
            args.push(binary.display().to_string());
        }

        let captured = run_captured(
            &self.tree,
            &Invocation {
                program,
                args,
                cwd: None,
                timeout: self.run_timeout,
            },
        )
        .await;

        if captured.success() {
            RunReport::success(0, captured.stdout)
        } else {
            let (kind, message) = Self::classify(&captured);
            RunReport::failure(kind, captured.code, message)
        }
    }
}

#[async_trait]
impl Toolchain for CommandToolchain {
    async fn compile(&self, job: &Job, source_dir: &Path, binary: &Path) -> CompileReport {
        match self.compile_inner(job, source_dir, binary).await {
            Ok(report) => report,
            // Directory listing faults are still per-job compile failures
            // from the matrix's point of view.
            Err(err) => CompileReport::failure(FailureKind::Spawn, None, err.to_string()),
        }
    }

    async fn compile_and_run(
        &self,
        job: Job,
        source_dir: PathBuf,
        temp_root: PathBuf,
    ) -> Result<(JobKey, ResultRecord), JobError> {
        let binary = job.binary_path(&temp_root);
        let compile = self.compile(&job, &source_dir, &binary).await;
        let key = job.key(&binary);
        if !compile.ok() {
            return Ok((key, ResultRecord::compile_failed(&job, compile)));
        }
        let run = self.run_inner(&job, &binary).await;
        Ok((key, ResultRecord::completed(&job, compile, run)))
    }

    async fn run(
        &self,
        job: Job,
        compile: CompileReport,
        binary: PathBuf,
    ) -> Result<(JobKey, ResultRecord), JobError> {
        let run = self.run_inner(&job, &binary).await;
        let key = job.key(&binary);
        Ok((key, ResultRecord::completed(&job, compile, run)))
    }
}
