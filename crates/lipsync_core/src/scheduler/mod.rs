//! Single-worker job scheduler.
//!
//! Jobs are run one at a time, in submission order, on a dedicated
//! background thread. Cancellation is cooperative: the scheduler flips
//! the job's `CancelToken` and the engine stops at its next check.

mod errors;
mod job_scheduler;
mod worker;

pub use errors::{CommandError, CommandResult};
pub use job_scheduler::{CancelOutcome, JobScheduler, ShutdownMode, SubmitOutcome};
