//! Event subscribers for the diffuzz runtime.
//!
//! The [`Subscribe`] trait is the extension point for plugging custom event
//! handlers into the runtime; the [`SubscriberSet`] fans events out to all of
//! them without blocking the publisher.
//!
//! ## Built-ins
//! - [`LogWriter`] — renders lifecycle events through `tracing` (round
//!   announcements, progress lines, skip warnings, critical consistency
//!   violations).
//! - [`ProgressTracker`] — stateful tracker of per-generator round progress,
//!   used by the scheduler to name stuck generators when the shutdown grace
//!   period is exceeded.

mod log;
mod progress;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use progress::{GeneratorProgress, ProgressTracker};
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
