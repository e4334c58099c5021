//! Job execution engine.
//!
//! - [`JobExecutor`]: runs a job's action and races it against cancellation
//!   and the deadline
//! - [`JobContext`]: cancellable, deadline-bound context with a resolve-once guard
//! - [`SlotPool`]: recycles [`JobSlot`]s between jobs
//! - [`JobAction`]: the work itself; [`EchoAction`] is the bundled one
//!
//! # Cancellation Note
//!
//! Cancellation and timeouts are cooperative. Once either fires the job is
//! reported as terminal, but its action only stops when it observes the
//! cancellation token. An action that ignores the token keeps running past
//! its deadline.

pub mod action;
pub mod context;
pub mod executor;
pub mod pool;

pub use action::{ActionError, EchoAction, FnAction, JobAction};
pub use context::{DoneReason, JobContext, ResolveOnce};
pub use executor::JobExecutor;
pub use pool::{JobSlot, Reusable, SlotPool};
