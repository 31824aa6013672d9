//! Feed synchronization.
//!
//! This module provides:
//! - `SyncEngine`: cursor-based detection of new items for one feed source
//! - `PollScheduler`: repeating sweeps with cooperative shutdown
//! - `Clock`: injectable time for both

mod clock;
mod engine;
mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{FetchOutcome, SweepReport, SyncEngine};
pub use scheduler::{PollScheduler, SchedulerHandle};
