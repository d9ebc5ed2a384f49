//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the scheduler, the round
//! loops, the aggregator, and the subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Scheduler`, `RoundLoop`, `aggregate::hand_off`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: `Scheduler::subscriber_listener()`, which fans out to the
//!   `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
