use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{TimeZone, Utc};

use super::{Duration, TimeUnit};

/// An instant, stored as a magnitude since the Unix epoch in some `TimeUnit`.
///
/// Comparison, equality and hashing are unit-normalized: `1 SECONDS` and
/// `1000 MILLISECONDS` are the same instant. Arithmetic yields a result in the
/// finer unit of its operands.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    time: i64,
    unit: TimeUnit,
}

impl Timestamp {
    pub fn new(time: i64, unit: TimeUnit) -> Self {
        Self { time, unit }
    }

    pub fn from_epoch_millis(millis: i64) -> Self {
        Self::new(millis, TimeUnit::Milliseconds)
    }

    pub fn from_epoch_seconds(seconds: i64) -> Self {
        Self::new(seconds, TimeUnit::Seconds)
    }

    /// The current wall-clock time at millisecond resolution.
    pub fn now() -> Self {
        Self::from_epoch_millis(Utc::now().timestamp_millis())
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn convert(&self, unit: TimeUnit) -> i64 {
        unit.convert(self.time, self.unit)
    }

    pub fn as_millis(&self) -> i64 {
        self.convert(TimeUnit::Milliseconds)
    }

    pub fn as_seconds(&self) -> i64 {
        self.convert(TimeUnit::Seconds)
    }

    pub fn plus(&self, d: Duration) -> Timestamp {
        let unit = TimeUnit::finest(self.unit, d.unit());
        Timestamp::new(self.convert(unit).saturating_add(d.convert(unit)), unit)
    }

    pub fn minus(&self, d: Duration) -> Timestamp {
        let unit = TimeUnit::finest(self.unit, d.unit());
        Timestamp::new(self.convert(unit).saturating_sub(d.convert(unit)), unit)
    }

    /// Elapsed time from `earlier` to `self`; negative when `earlier` is later.
    pub fn delta(&self, earlier: &Timestamp) -> Duration {
        let unit = TimeUnit::finest(self.unit, earlier.unit);
        Duration::new(self.convert(unit).saturating_sub(earlier.convert(unit)), unit)
    }

    /// Rounds down to the nearest multiple of `step`.
    ///
    /// A non-positive step leaves the timestamp unchanged.
    pub fn step_floor(&self, step: Duration) -> Timestamp {
        let unit = TimeUnit::finest(self.unit, step.unit());
        let size = step.convert(unit);
        if size <= 0 {
            return *self;
        }

        let time = self.convert(unit);
        let floor = time.div_euclid(size).checked_mul(size).unwrap_or(i64::MIN);
        Timestamp::new(floor, unit)
    }

    /// Rounds up to the nearest multiple of `step`. An instant already on a
    /// boundary is returned as is.
    pub fn step_ceiling(&self, step: Duration) -> Timestamp {
        let unit = TimeUnit::finest(self.unit, step.unit());
        let size = step.convert(unit);
        if size <= 0 || self.convert(unit).rem_euclid(size) == 0 {
            return *self;
        }

        self.step_floor(step).plus(step)
    }

    fn as_nanos(&self) -> i128 {
        self.time as i128 * self.unit.nanos_per_unit()
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_nanos().cmp(&other.as_nanos())
    }
}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_nanos().hash(state);
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Utc.timestamp_millis_opt(self.as_millis()).single() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "Timestamp[{}, {}]", self.time, self.unit),
        }
    }
}
