//! Error types used by the diffuzz runtime.
//!
//! Two enums split the failure space the way the rest of the crate thinks
//! about it:
//!
//! - [`RuntimeError`] — errors raised by the top-level orchestration
//!   (scheduler, shutdown sequencing).
//! - [`JobError`] — errors raised by the dispatch machinery itself. These are
//!   *not* compiler or run failures: a toolchain that exits non-zero or times
//!   out is recorded in a [`ResultRecord`](crate::pipeline::ResultRecord),
//!   never raised. A `JobError` escaping a task iteration aborts the round;
//!   the round loop logs it and restarts.
//!
//! Both types provide `as_label()` for stable snake_case identifiers in
//! logs and metrics.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the orchestration runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some generator workers were still
    /// running and the process tree was force-terminated.
    #[error("shutdown grace {grace:?} exceeded; stuck generators: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Generators whose round loops did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// Errors produced by the dispatch machinery.
///
/// Everything here means "the orchestrator broke", not "the program under
/// test broke". Per-job compile and run failures are data, carried inside
/// result records.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum JobError {
    /// Filesystem fault while staging or tearing down a task.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A compiler was asked to build a language it has no descriptor for.
    /// Indicates an inconsistent configuration, not a per-job failure.
    #[error("compiler {compiler} has no descriptor for language {language}")]
    UnsupportedLanguage {
        /// Compiler name from the configuration.
        compiler: String,
        /// The generator's target language.
        language: String,
    },

    /// A scheduled job's worker could not be joined (panic or abort).
    #[error("job worker failed to join: {message}")]
    Join {
        /// Join failure detail.
        message: String,
    },

    /// Internal invariant violation inside the dispatcher.
    #[error("internal dispatch error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl JobError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::Io(_) => "job_io",
            JobError::UnsupportedLanguage { .. } => "job_unsupported_language",
            JobError::Join { .. } => "job_join",
            JobError::Internal { .. } => "job_internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let err = RuntimeError::GraceExceeded {
            grace: Duration::from_secs(5),
            stuck: vec![],
        };
        assert_eq!(err.as_label(), "runtime_grace_exceeded");

        let err = JobError::Internal {
            message: "boom".into(),
        };
        assert_eq!(err.as_label(), "job_internal");
    }
}
