//! Unit-aware instants and durations.
//!
//! Magnitudes keep the unit they were created with; comparisons normalize to
//! the finer unit of the pair so values built at different resolutions can be
//! mixed freely.

mod duration;
mod timestamp;
mod unit;

pub use duration::Duration;
pub use timestamp::Timestamp;
pub use unit::TimeUnit;
