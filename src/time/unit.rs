use std::fmt;

use serde::{Deserialize, Serialize};

/// Granularity of a `Timestamp` or `Duration` magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub(crate) fn nanos_per_unit(self) -> i128 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 3_600 * 1_000_000_000,
            TimeUnit::Days => 86_400 * 1_000_000_000,
        }
    }

    /// Converts `value`, expressed in `from`, into this unit.
    ///
    /// Conversion to a coarser unit truncates toward zero; results outside the
    /// `i64` range saturate.
    pub fn convert(self, value: i64, from: TimeUnit) -> i64 {
        let nanos = value as i128 * from.nanos_per_unit();
        let converted = nanos / self.nanos_per_unit();
        converted.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// True when `a` is strictly finer-grained than `b`.
    pub fn is_finer(a: TimeUnit, b: TimeUnit) -> bool {
        a.nanos_per_unit() < b.nanos_per_unit()
    }

    /// Returns the finer of two units.
    pub fn finest(a: TimeUnit, b: TimeUnit) -> TimeUnit {
        if TimeUnit::is_finer(b, a) {
            b
        } else {
            a
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeUnit::Nanoseconds => "NANOSECONDS",
            TimeUnit::Microseconds => "MICROSECONDS",
            TimeUnit::Milliseconds => "MILLISECONDS",
            TimeUnit::Seconds => "SECONDS",
            TimeUnit::Minutes => "MINUTES",
            TimeUnit::Hours => "HOURS",
            TimeUnit::Days => "DAYS",
        };
        write!(f, "{}", name)
    }
}
