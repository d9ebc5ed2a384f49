//! JSON-persisting [`Analyze`] implementation.
//!
//! Triage here is deliberately coarse: a task is *interesting* if any job
//! failed a phase or if successful runs disagree on their observable
//! output. Interesting tasks get their full result set, the generated
//! source, and a host snapshot persisted under the generator's catch
//! directory; everything else is dropped with the task's temp directory.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::JobError;
use crate::machine::MachineInfo;
use crate::pipeline::{AnalysisContext, Analyze, PhaseStatus, ResultSet, Seed};

/// Everything written to disk for one interesting task.
#[derive(Serialize)]
struct CatchRecord<'a> {
    id: String,
    seed: Seed,
    generator: &'a str,
    partial_timeout: bool,
    machine: &'a MachineInfo,
    results: &'a ResultSet,
}

/// Analyzer that persists interesting tasks as pretty-printed JSON.
#[derive(Default)]
pub struct JsonSink;

impl JsonSink {
    /// Creates a sink.
    pub fn new() -> Self {
        Self
    }

    /// True when the result set warrants persistence.
    fn interesting(results: &ResultSet) -> bool {
        let mut outputs = BTreeSet::new();
        for record in results.values() {
            if record.compile.status == PhaseStatus::Failure {
                return true;
            }
            match &record.run {
                None => return true,
                Some(run) if run.status == PhaseStatus::Failure => return true,
                Some(run) => {
                    outputs.insert(run.output.clone().unwrap_or_default());
                }
            }
        }
        // Successful runs that disagree are the differential signal.
        outputs.len() > 1
    }
}

#[async_trait]
impl Analyze for JsonSink {
    async fn analyze(&self, ctx: AnalysisContext<'_>) -> Result<(), JobError> {
        if !Self::interesting(ctx.results) {
            return Ok(());
        }

        let record = CatchRecord {
            id: ctx.id.to_string(),
            seed: ctx.seed,
            generator: &ctx.generator.name,
            partial_timeout: ctx.partial_timeout,
            machine: ctx.machine,
            results: ctx.results,
        };
        let json = serde_json::to_vec_pretty(&record).map_err(|err| JobError::Internal {
            message: format!("failed to serialize catch record: {err}"),
        })?;

        let dest = ctx.catch_root.join(ctx.id.to_string());
        tokio::fs::create_dir_all(&dest).await?;
        tokio::fs::write(dest.join("results.json"), json).await?;

        // Preserve the source before cleanup deletes the task directory.
        let source = ctx.source_dir.join(&ctx.generator.source_file);
        if tokio::fs::try_exists(&source).await? {
            tokio::fs::copy(&source, dest.join(&ctx.generator.source_file)).await?;
        }

        tracing::info!(
            task = %ctx.id,
            generator = %ctx.generator.name,
            records = ctx.results.len(),
            "interesting task persisted to catch directory"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompilerConfig, GeneratorConfig};
    use crate::pipeline::{
        CompileReport, FailureKind, Job, ResultRecord, RunReport, TaskId,
    };
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn job() -> Job {
        Job {
            id: TaskId::mint(),
            seed: Seed(5),
            generator: Arc::from("csmith"),
            compiler: Arc::new(CompilerConfig {
                name: "gcc".into(),
                executable: "gcc".into(),
                file_stem: "gcc".into(),
                opt_levels: vec!["-O0".into()],
                languages: BTreeMap::new(),
            }),
            opt_level: "-O0".into(),
            runner: None,
        }
    }

    fn completed(output: &str) -> ResultRecord {
        ResultRecord::completed(
            &job(),
            CompileReport::success(0),
            RunReport::success(0, output),
        )
    }

    #[test]
    fn unanimous_success_is_not_interesting() {
        let mut results = ResultSet::new();
        results.insert("a".into(), completed("42"));
        results.insert("b".into(), completed("42"));
        assert!(!JsonSink::interesting(&results));
    }

    #[test]
    fn output_disagreement_is_interesting() {
        let mut results = ResultSet::new();
        results.insert("a".into(), completed("42"));
        results.insert("b".into(), completed("17"));
        assert!(JsonSink::interesting(&results));
    }

    #[test]
    fn any_phase_failure_is_interesting() {
        let mut results = ResultSet::new();
        results.insert("a".into(), completed("42"));
        results.insert(
            "b".into(),
            ResultRecord::compile_failed(
                &job(),
                CompileReport::failure(FailureKind::NonZeroExit, Some(1), "boom"),
            ),
        );
        assert!(JsonSink::interesting(&results));

        let mut results = ResultSet::new();
        results.insert(
            "crash".into(),
            ResultRecord::completed(
                &job(),
                CompileReport::success(0),
                RunReport::failure(FailureKind::Signal, None, "signal 11"),
            ),
        );
        assert!(JsonSink::interesting(&results));
    }

    #[tokio::test]
    async fn interesting_task_lands_in_the_catch_directory() {
        let base = tempfile::tempdir().unwrap();
        let source_dir = base.path().join("task");
        std::fs::create_dir_all(&source_dir).unwrap();
        std::fs::write(source_dir.join("test.c"), "int main(){}").unwrap();
        let catch_root = base.path().join("catch");
        std::fs::create_dir_all(&catch_root).unwrap();

        let generator = GeneratorConfig {
            name: "csmith".into(),
            language: "c".into(),
            command: "csmith".into(),
            args: vec![],
            seed_flag: None,
            source_file: "test.c".into(),
        };
        let machine = MachineInfo::collect();
        let id = TaskId::mint();

        let mut results = ResultSet::new();
        results.insert("a".into(), completed("42"));
        results.insert("b".into(), completed("17"));

        let ctx = AnalysisContext {
            compilers: &[],
            source_dir: &source_dir,
            temp_root: base.path(),
            catch_root: &catch_root,
            generator: &generator,
            id,
            seed: Seed(5),
            results: &results,
            machine: &machine,
            partial_timeout: true,
        };
        JsonSink::new().analyze(ctx).await.unwrap();

        let dest = catch_root.join(id.to_string());
        assert!(dest.join("results.json").exists());
        assert!(dest.join("test.c").exists());
        let text = std::fs::read_to_string(dest.join("results.json")).unwrap();
        assert!(text.contains("\"seed\": 5"));
    }
}
