//! Output directory layout.
//!
//! Two roots, each with one subdirectory per generator:
//!
//! ```text
//! <base>/temp/<generator>/<task-id>/   ephemeral, deleted at task end
//! <base>/catch/<generator>/            durable, written by the analyzer
//! ```
//!
//! Ownership is partitioned by task identity: no two tasks, generators, or
//! jobs ever write to the same directory, so no locking is needed anywhere
//! in the filesystem layer.

use std::path::{Path, PathBuf};

use crate::config::GeneratorConfig;

/// Roots of the temp and catch trees.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    /// Root of the ephemeral per-task directories.
    pub temp_root: PathBuf,
    /// Root of the durable catch directories.
    pub catch_root: PathBuf,
}

/// A single generator's private directories.
#[derive(Clone, Debug)]
pub struct GeneratorDirs {
    /// Per-generator temp root; each task creates `<temp>/<task-id>` below it.
    pub temp: PathBuf,
    /// Per-generator catch directory, owned by the analyzer.
    pub catch: PathBuf,
}

impl OutputLayout {
    /// Creates a layout rooted at `base`.
    pub fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            temp_root: base.join("temp"),
            catch_root: base.join("catch"),
        }
    }

    /// Returns the directories dedicated to `generator`.
    pub fn for_generator(&self, generator: &str) -> GeneratorDirs {
        GeneratorDirs {
            temp: self.temp_root.join(generator),
            catch: self.catch_root.join(generator),
        }
    }

    /// Creates every generator's temp and catch directory.
    pub fn setup(&self, generators: &[impl AsRef<GeneratorConfig>]) -> std::io::Result<()> {
        for generator in generators {
            let dirs = self.for_generator(&generator.as_ref().name);
            std::fs::create_dir_all(&dirs.temp)?;
            std::fs::create_dir_all(&dirs.catch)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(name: &str) -> GeneratorConfig {
        GeneratorConfig {
            name: name.into(),
            language: "c".into(),
            command: "true".into(),
            args: vec![],
            seed_flag: None,
            source_file: "test.c".into(),
        }
    }

    #[test]
    fn setup_creates_per_generator_dirs() {
        let base = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(base.path());
        let gens = vec![std::sync::Arc::new(generator("csmith"))];
        layout.setup(&gens).unwrap();

        let dirs = layout.for_generator("csmith");
        assert!(dirs.temp.is_dir());
        assert!(dirs.catch.is_dir());
        assert!(dirs.temp.starts_with(base.path().join("temp")));
    }
}
