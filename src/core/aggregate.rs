//! Result aggregation: the hand-off between the dispatcher and the analyzer.
//!
//! A non-empty result set is forwarded to the analysis collaborator with
//! everything it needs (task identity, seed, machine info, compiler set,
//! directories, partial-timeout policy). An empty set for a task that had a
//! valid generated artifact is an internal-consistency violation: the
//! dispatcher guarantees at least one outcome per configured combination, so
//! this state indicates a dispatcher defect, never a legitimate result. It
//! is logged at the highest severity and published, but does not halt the
//! round loop.

use std::sync::Arc;

use crate::error::JobError;
use crate::events::{Bus, Event, EventKind};
use crate::pipeline::{AnalysisContext, Analyze};

/// Forwards a task's result set to the analyzer, or reports the
/// empty-result-set violation.
pub(crate) async fn hand_off(
    analyze: &Arc<dyn Analyze>,
    ctx: AnalysisContext<'_>,
    bus: &Bus,
) -> Result<(), JobError> {
    if ctx.results.is_empty() {
        tracing::error!(
            generator = %ctx.generator.name,
            task = %ctx.id,
            "critical: empty result set for a generated artifact; dispatcher defect"
        );
        bus.publish(
            Event::new(EventKind::EmptyResultSet)
                .with_generator(ctx.generator.name.as_str())
                .with_task(ctx.id.to_string()),
        );
        return Ok(());
    }
    analyze.analyze(ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::machine::MachineInfo;
    use crate::pipeline::{ResultSet, Seed, TaskId};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAnalyzer(AtomicUsize);

    #[async_trait]
    impl Analyze for CountingAnalyzer {
        async fn analyze(&self, _ctx: AnalysisContext<'_>) -> Result<(), JobError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn ctx<'a>(
        generator: &'a GeneratorConfig,
        results: &'a ResultSet,
        machine: &'a MachineInfo,
    ) -> AnalysisContext<'a> {
        AnalysisContext {
            compilers: &[],
            source_dir: Path::new("/tmp/src"),
            temp_root: Path::new("/tmp/t"),
            catch_root: Path::new("/tmp/c"),
            generator,
            id: TaskId::mint(),
            seed: Seed(1),
            results,
            machine,
            partial_timeout: true,
        }
    }

    fn generator() -> GeneratorConfig {
        GeneratorConfig {
            name: "csmith".into(),
            language: "c".into(),
            command: "csmith".into(),
            args: vec![],
            seed_flag: None,
            source_file: "test.c".into(),
        }
    }

    #[tokio::test]
    async fn empty_set_publishes_critical_event_and_skips_analysis() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let analyzer = Arc::new(CountingAnalyzer(AtomicUsize::new(0)));
        let analyze: Arc<dyn Analyze> = analyzer.clone();

        let gen = generator();
        let results = ResultSet::new();
        let machine = MachineInfo::collect();
        hand_off(&analyze, ctx(&gen, &results, &machine), &bus)
            .await
            .unwrap();

        assert_eq!(analyzer.0.load(Ordering::SeqCst), 0);
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::EmptyResultSet);
        assert_eq!(ev.generator.as_deref(), Some("csmith"));
    }

    #[tokio::test]
    async fn non_empty_set_reaches_the_analyzer() {
        use crate::config::CompilerConfig;
        use crate::pipeline::{CompileReport, Job, ResultRecord, RunReport};
        use std::collections::BTreeMap;

        let bus = Bus::new(16);
        let analyzer = Arc::new(CountingAnalyzer(AtomicUsize::new(0)));
        let analyze: Arc<dyn Analyze> = analyzer.clone();

        let gen = generator();
        let job = Job {
            id: TaskId::mint(),
            seed: Seed(1),
            generator: "csmith".into(),
            compiler: Arc::new(CompilerConfig {
                name: "gcc".into(),
                executable: "gcc".into(),
                file_stem: "gcc".into(),
                opt_levels: vec!["-O0".into()],
                languages: BTreeMap::new(),
            }),
            opt_level: "-O0".into(),
            runner: None,
        };
        let mut results = ResultSet::new();
        results.insert(
            "gcc_O0".into(),
            ResultRecord::completed(&job, CompileReport::success(0), RunReport::success(0, "ok")),
        );
        let machine = MachineInfo::collect();

        hand_off(&analyze, ctx(&gen, &results, &machine), &bus)
            .await
            .unwrap();
        assert_eq!(analyzer.0.load(Ordering::SeqCst), 1);
    }
}
