//! The compiler/generator matrix: who generates, who compiles, how binaries
//! get executed.
//!
//! All types here are immutable after startup. The JSON config file carries
//! one compiler set per platform key (`linux-little`, `linux-big`,
//! `windows`); [`ConfigFile::resolve_compilers`] picks the set for the
//! current OS and the `--endian` flag, falling back to `linux-little` on
//! unrecognized platforms.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or resolving the configuration file.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the expected schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Path that was attempted.
        path: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// The resolved platform key has no compiler set.
    #[error("no compiler set configured for platform key {key:?}")]
    MissingCompilerSet {
        /// The key that resolution produced.
        key: String,
    },

    /// The config declares no generators; there is nothing to fuzz.
    #[error("config declares no generators")]
    NoGenerators,
}

/// Target byte order, consumed only for compiler-set resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    /// Little-endian targets (default).
    Little,
    /// Big-endian targets.
    Big,
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endian::Little => write!(f, "little"),
            Endian::Big => write!(f, "big"),
        }
    }
}

/// Identifies one test-case generator.
///
/// A generator is an external program (csmith, yarpgen, ...) that emits a
/// random source program; the orchestrator only knows how to invoke it and
/// which language it targets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Unique generator name; also names its temp and catch directories.
    pub name: String,
    /// Target source language, matched against compiler descriptors.
    pub language: String,
    /// Generator executable.
    pub command: String,
    /// Fixed arguments passed on every invocation.
    #[serde(default)]
    pub args: Vec<String>,
    /// Flag used to pass the random seed (e.g. `-s`); omitted if absent.
    #[serde(default)]
    pub seed_flag: Option<String>,
    /// File name the generated source is written to inside the task
    /// directory.
    pub source_file: String,
}

/// Per-language descriptor of a compiler.
///
/// `runners` is present when the compiled artifact is not natively
/// executable on the host (e.g. a wasm target): each entry maps a runner
/// name to the command that executes the binary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LanguageSupport {
    /// Alternate execution environments, name → command. Absent for
    /// natively executable output.
    #[serde(default)]
    pub runners: Option<BTreeMap<String, String>>,
}

/// Identifies one compiler/toolchain and its optimization sweep.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Unique compiler name, recorded in every result record.
    pub name: String,
    /// Toolchain executable.
    pub executable: String,
    /// Display stem for produced binaries (`gcc`, `clang`, ...).
    pub file_stem: String,
    /// Optimization-level flags to sweep (`-O0`..`-O3` and friends).
    pub opt_levels: Vec<String>,
    /// Source-language descriptors, keyed by language name.
    pub languages: BTreeMap<String, LanguageSupport>,
}

impl CompilerConfig {
    /// Returns the descriptor for `language`, if this compiler supports it.
    pub fn support(&self, language: &str) -> Option<&LanguageSupport> {
        self.languages.get(language)
    }
}

/// On-disk configuration: generators plus per-platform compiler sets.
#[derive(Clone, Debug, Deserialize)]
pub struct ConfigFile {
    /// Configured generators, one round loop each.
    pub generators: Vec<GeneratorConfig>,
    /// Compiler sets keyed by platform (`linux-little`, `linux-big`,
    /// `windows`).
    pub compiler_sets: BTreeMap<String, Vec<CompilerConfig>>,
}

impl ConfigFile {
    /// Loads and validates the configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: ConfigFile =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        if file.generators.is_empty() {
            return Err(ConfigError::NoGenerators);
        }
        Ok(file)
    }

    /// Resolves the compiler set for the given OS and target byte order.
    ///
    /// Windows maps to the `windows` set; Linux picks by endianness; any
    /// other platform falls back to `linux-little`.
    pub fn resolve_compilers(
        &self,
        os: &str,
        endian: Endian,
    ) -> Result<Vec<Arc<CompilerConfig>>, ConfigError> {
        let key = platform_key(os, endian);
        let set = self
            .compiler_sets
            .get(key)
            .ok_or_else(|| ConfigError::MissingCompilerSet {
                key: key.to_string(),
            })?;
        Ok(set.iter().cloned().map(Arc::new).collect())
    }
}

fn platform_key(os: &str, endian: Endian) -> &'static str {
    match os {
        "windows" => "windows",
        "linux" => match endian {
            Endian::Big => "linux-big",
            Endian::Little => "linux-little",
        },
        _ => "linux-little",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "generators": [
            {
                "name": "csmith",
                "language": "c",
                "command": "csmith",
                "seed_flag": "-s",
                "source_file": "test.c"
            }
        ],
        "compiler_sets": {
            "linux-little": [
                {
                    "name": "gcc",
                    "executable": "gcc",
                    "file_stem": "gcc",
                    "opt_levels": ["-O0", "-O2"],
                    "languages": { "c": {} }
                },
                {
                    "name": "emcc",
                    "executable": "emcc",
                    "file_stem": "emcc",
                    "opt_levels": ["-O1"],
                    "languages": {
                        "c": {
                            "runners": {
                                "node": "node",
                                "wasmtime": "wasmtime run"
                            }
                        }
                    }
                }
            ],
            "windows": []
        }
    }"#;

    fn load_sample() -> ConfigFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        ConfigFile::load(file.path()).unwrap()
    }

    #[test]
    fn parses_generators_and_runners() {
        let cfg = load_sample();
        assert_eq!(cfg.generators.len(), 1);
        assert_eq!(cfg.generators[0].language, "c");

        let set = cfg.compiler_sets.get("linux-little").unwrap();
        assert!(set[0].support("c").unwrap().runners.is_none());
        let runners = set[1].support("c").unwrap().runners.as_ref().unwrap();
        assert_eq!(runners.len(), 2);
        assert_eq!(runners.get("wasmtime").unwrap(), "wasmtime run");
    }

    #[test]
    fn resolution_by_os_and_endian() {
        let cfg = load_sample();
        assert_eq!(
            cfg.resolve_compilers("linux", Endian::Little).unwrap().len(),
            2
        );
        assert_eq!(cfg.resolve_compilers("windows", Endian::Little).unwrap().len(), 0);
        // Unknown platforms fall back to the little-endian Linux set.
        assert_eq!(
            cfg.resolve_compilers("freebsd", Endian::Big).unwrap().len(),
            2
        );
    }

    #[test]
    fn missing_set_is_an_error() {
        let cfg = load_sample();
        let err = cfg.resolve_compilers("linux", Endian::Big).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCompilerSet { key } if key == "linux-big"));
    }

    #[test]
    fn empty_generator_list_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"generators": [], "compiler_sets": {}}"#)
            .unwrap();
        let err = ConfigFile::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NoGenerators));
    }
}
