//! Test-case generation seam.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::GeneratorConfig;
use crate::error::JobError;
use crate::pipeline::{Seed, TaskId};

/// The output of a successful generation.
#[derive(Clone, Debug)]
pub struct GeneratedArtifact {
    /// Directory containing the generated source file(s), scoped to the
    /// task identity and deleted by cleanup at task end.
    pub source_dir: PathBuf,
    /// The random seed that produced the program.
    pub seed: Seed,
}

/// Produces a random source program for one task.
///
/// Returning `Ok(None)` signals generation failure: the round loop counts a
/// skip and moves to the next task index. Only machinery faults (filesystem
/// errors while staging the task directory) are raised.
#[async_trait]
pub trait Generate: Send + Sync + 'static {
    /// Generates a source program under `temp_root`, namespaced by `id`.
    async fn generate(
        &self,
        id: TaskId,
        config: &GeneratorConfig,
        temp_root: &Path,
    ) -> Result<Option<GeneratedArtifact>, JobError>;
}
