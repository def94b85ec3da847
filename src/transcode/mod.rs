//! Transcode: the offline pipeline that turns source videos into sealed
//! Segment Bundles, and the scheduler that drives it across channels.

pub mod scheduler;
pub mod worker;

pub use scheduler::{Scheduler, SchedulerProgress};
pub use worker::{TranscodeOutcome, TranscodeWorker};
