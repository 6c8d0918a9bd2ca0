/// Scheduler module - per-tick job coalescing and periodic frame subscribers

pub mod job_queue;
pub mod frame_clock;
pub mod frame_scheduler;

pub use job_queue::JobQueue;
pub use frame_clock::{FrameClock, FrameInfo};
pub use frame_scheduler::{FrameScheduler, SubscriptionId, TickOutcome};
