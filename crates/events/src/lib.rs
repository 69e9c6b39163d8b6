//! Job lifecycle infrastructure for the avstudio pipeline.
//!
//! This crate provides the in-memory building blocks every job flows
//! through:
//!
//! - [`JobStore`] is the single source of truth for job records and spawns
//!   the configured [`JobExecutor`] for each new job.
//! - [`bus`] holds per-job subscriber sets, notified under the store lock so
//!   no observer sees a partially-applied update.
//! - [`JobStream`] replays a job's state on connect and follows it to
//!   its terminal state as `connected` / `status` / `completed` events.
//! - [`progress`] maps progress to the milestone phrases shown to clients.

pub mod bus;
pub mod progress;
pub mod store;
pub mod stream;

pub use bus::Subscription;
pub use store::{JobError, JobExecutor, JobStore};
pub use stream::{JobStream, StreamError, StreamEvent};
