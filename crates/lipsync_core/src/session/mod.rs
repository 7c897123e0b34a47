//! The session: what a front end talks to.
//!
//! A [`Session`] owns the state store and the job scheduler. It loads
//! character files, rebuilds the job set, and routes submit/cancel
//! commands. Observers read snapshots or subscribe to [`StateEvent`]s.
//!
//! [`StateEvent`]: crate::state::StateEvent

mod controller;
mod errors;

pub use controller::Session;
pub use errors::{SessionError, SessionResult};
