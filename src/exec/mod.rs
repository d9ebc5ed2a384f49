//! Process-backed implementations of the pipeline seams.
//!
//! Everything here shells out to real executables through the shared
//! [`command`] runner, which owns output capture, timeouts, and
//! process-group registration with the [`ProcessTree`](crate::core::ProcessTree):
//! - [`CommandGenerator`] — invokes the configured generator, seeds it,
//!   writes its stdout as the task's source file;
//! - [`CommandToolchain`] — invokes compilers and runners, classifies their
//!   outcomes into structured reports;
//! - [`JsonSink`] — persists interesting result sets as JSON under the
//!   catch directory.

mod command;
mod generate;
mod sink;
mod toolchain;

pub use generate::CommandGenerator;
pub use sink::JsonSink;
pub use toolchain::CommandToolchain;
