//! Result analysis seam.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{CompilerConfig, GeneratorConfig};
use crate::error::JobError;
use crate::machine::MachineInfo;
use crate::pipeline::{ResultSet, Seed, TaskId};

/// Everything the analyzer needs to triage one task's result set.
pub struct AnalysisContext<'a> {
    /// The compiler set the matrix was built from.
    pub compilers: &'a [Arc<CompilerConfig>],
    /// Directory of the generated source(s).
    pub source_dir: &'a Path,
    /// The generator's temp root.
    pub temp_root: &'a Path,
    /// The generator's durable catch directory.
    pub catch_root: &'a Path,
    /// The generator that produced the program.
    pub generator: &'a GeneratorConfig,
    /// Task identity.
    pub id: TaskId,
    /// Seed of the generated program.
    pub seed: Seed,
    /// All result records for the task.
    pub results: &'a ResultSet,
    /// Host snapshot.
    pub machine: &'a MachineInfo,
    /// Whether run timeouts are soft failures; threaded unmodified from the
    /// command line.
    pub partial_timeout: bool,
}

/// Decides what is interesting in a task's results and persists it.
///
/// The orchestrator never interprets the result set itself; bug
/// classification is entirely this collaborator's contract.
#[async_trait]
pub trait Analyze: Send + Sync + 'static {
    /// Triages one task's result set.
    async fn analyze(&self, ctx: AnalysisContext<'_>) -> Result<(), JobError>;
}
