//! Thread-safe observable state shared by the worker and observers.
//!
//! This module provides:
//! - `StateStore`: the single lock around file model, jobs and queue
//! - `SessionSnapshot`: consistent copy of everything for polling readers
//! - `StateEvent`: change notifications for subscribers
//!
//! Every mutation runs inside one critical section and its events are
//! sent before the lock is released, so subscribers receive each job's
//! updates in the order they happened.

mod events;
mod store;

pub use events::StateEvent;
pub use store::{SessionSnapshot, StateStore, StoreOptions, DEFAULT_PROGRESS_MIN_DELTA};

pub(crate) use store::{ActiveJob, SharedState};
