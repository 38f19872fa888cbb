//! Domain layer: resource slots and backoff schedules. No I/O.

pub mod schedule;
pub mod slot;

pub use schedule::{BackoffSchedule, DelayStrategy, DEFAULT_DELAY_CYCLE};
pub use slot::ResourceSlot;
