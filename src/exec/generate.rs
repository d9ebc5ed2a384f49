//! Process-backed [`Generate`] implementation.
//!
//! Invokes the configured generator executable with a fresh random seed and
//! writes its stdout as the task's source file. Any generator misbehavior
//! (spawn failure, non-zero exit, timeout, empty output) is a *skip*, never
//! an error: the round loop counts it and moves on.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Config, GeneratorConfig};
use crate::core::ProcessTree;
use crate::error::JobError;
use crate::pipeline::{Generate, GeneratedArtifact, Seed, TaskId};

use super::command::{run_captured, Invocation};

/// Generator that shells out to the configured command.
pub struct CommandGenerator {
    tree: Arc<ProcessTree>,
    timeout: Duration,
}

impl CommandGenerator {
    /// Creates a generator bound to the process tree for cleanup.
    pub fn new(tree: Arc<ProcessTree>, cfg: &Config) -> Self {
        Self {
            tree,
            timeout: cfg.generate_timeout,
        }
    }
}

#[async_trait]
impl Generate for CommandGenerator {
    async fn generate(
        &self,
        id: TaskId,
        config: &GeneratorConfig,
        temp_root: &Path,
    ) -> Result<Option<GeneratedArtifact>, JobError> {
        let source_dir = temp_root.join(id.to_string());
        tokio::fs::create_dir_all(&source_dir).await?;

        let seed = Seed(rand::random::<u64>());
        let mut args = config.args.clone();
        if let Some(flag) = &config.seed_flag {
            args.push(flag.clone());
            args.push(seed.to_string());
        }

        let captured = run_captured(
            &self.tree,
            &Invocation {
                program: config.command.clone(),
                args,
                cwd: Some(source_dir.clone()),
                timeout: self.timeout,
            },
        )
        .await;

        if !captured.success() || captured.stdout.is_empty() {
            tracing::debug!(
                generator = %config.name,
                task = %id,
                code = ?captured.code,
                timed_out = captured.timed_out,
                spawn_error = ?captured.spawn_error,
                "generator invocation produced nothing usable"
            );
            // The skip path owns its own cleanup: the round loop only
            // deletes task directories for tasks that produced an artifact.
            tokio::fs::remove_dir_all(&source_dir).await?;
            return Ok(None);
        }

        tokio::fs::write(source_dir.join(&config.source_file), &captured.stdout).await?;
        Ok(Some(GeneratedArtifact { source_dir, seed }))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn generator(command: &str, args: &[&str]) -> GeneratorConfig {
        GeneratorConfig {
            name: "stub".into(),
            language: "c".into(),
            command: command.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            seed_flag: None,
            source_file: "test.c".into(),
        }
    }

    fn command_generator() -> CommandGenerator {
        CommandGenerator::new(Arc::new(ProcessTree::new()), &Config::default())
    }

    #[tokio::test]
    async fn stdout_becomes_the_source_file() {
        let temp = tempfile::tempdir().unwrap();
        let id = TaskId::mint();
        let artifact = command_generator()
            .generate(id, &generator("echo", &["int main(){}"]), temp.path())
            .await
            .unwrap()
            .expect("generation should succeed");

        assert_eq!(artifact.source_dir, temp.path().join(id.to_string()));
        let text = std::fs::read_to_string(artifact.source_dir.join("test.c")).unwrap();
        assert_eq!(text.trim(), "int main(){}");
    }

    #[tokio::test]
    async fn failing_generator_is_a_skip() {
        let temp = tempfile::tempdir().unwrap();
        let out = command_generator()
            .generate(TaskId::mint(), &generator("false", &[]), temp.path())
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn skip_leaves_no_task_directory_behind() {
        // The round loop never cleans up after a skip, so any directory
        // staged before the generator ran must be gone by the time the skip
        // is reported, or an unattended run accumulates one per skip.
        let temp = tempfile::tempdir().unwrap();
        let gen = command_generator();

        for config in [generator("false", &[]), generator("true", &[])] {
            let out = gen
                .generate(TaskId::mint(), &config, temp.path())
                .await
                .unwrap();
            assert!(out.is_none());
        }
        let residue: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert!(residue.is_empty(), "skip path leaked task dirs: {residue:?}");
    }

    #[tokio::test]
    async fn missing_generator_is_a_skip_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let out = command_generator()
            .generate(
                TaskId::mint(),
                &generator("definitely-not-a-generator", &[]),
                temp.path(),
            )
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn empty_output_is_a_skip() {
        let temp = tempfile::tempdir().unwrap();
        let out = command_generator()
            .generate(TaskId::mint(), &generator("true", &[]), temp.path())
            .await
            .unwrap();
        assert!(out.is_none());
    }
}
