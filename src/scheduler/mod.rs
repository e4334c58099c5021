//! Job tracking: identifiers, status records and the coordinator facade.
//!
//! - [`JobId`]: random identifiers, validated when parsed from a request path
//! - [`ResultStore`]: current [`JobResult`] of every known job
//! - [`Registry`]: cancellable [`JobHandle`] of every in-flight job
//! - [`Coordinator`]: submit / cancel / get / list / info
//!
//! A job's record moves from `Pending` to exactly one of `Success`, `Failed`
//! or `Cancelled` and never changes again. Its handle leaves the registry as
//! soon as the job is cancelled or finishes.

pub mod coordinator;
pub mod id;
pub mod job;
pub mod registry;
pub mod store;

pub use coordinator::Coordinator;
pub use id::JobId;
pub use job::{JobOutcome, JobRequest, JobResult, JobStatus, StatusCounts};
pub use registry::{JobHandle, Registry};
pub use store::ResultStore;
