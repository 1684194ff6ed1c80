use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::TimeUnit;

/// A span of time: a magnitude in some `TimeUnit`.
///
/// Equality and ordering compare the effective length, so one second equals
/// one thousand milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Duration {
    duration: i64,
    unit: TimeUnit,
}

impl Duration {
    pub fn new(duration: i64, unit: TimeUnit) -> Self {
        Self { duration, unit }
    }

    pub fn millis(millis: i64) -> Self {
        Self::new(millis, TimeUnit::Milliseconds)
    }

    pub fn seconds(seconds: i64) -> Self {
        Self::new(seconds, TimeUnit::Seconds)
    }

    pub fn minutes(minutes: i64) -> Self {
        Self::new(minutes, TimeUnit::Minutes)
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn convert(&self, unit: TimeUnit) -> i64 {
        unit.convert(self.duration, self.unit)
    }

    pub fn as_millis(&self) -> i64 {
        self.convert(TimeUnit::Milliseconds)
    }

    pub fn as_seconds(&self) -> i64 {
        self.convert(TimeUnit::Seconds)
    }

    /// Scales the magnitude, keeping the unit.
    pub fn times(&self, value: i64) -> Self {
        Self::new(self.duration.saturating_mul(value), self.unit)
    }

    fn as_nanos(&self) -> i128 {
        self.duration as i128 * self.unit.nanos_per_unit()
    }
}

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Duration {}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_nanos().cmp(&other.as_nanos())
    }
}

impl Hash for Duration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_nanos().hash(state);
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration[{}, {}]", self.duration, self.unit)
    }
}
