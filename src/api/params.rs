use chrono::DateTime;
use serde::Deserialize;

use crate::time::{Duration, Timestamp};
use crate::{Result, SeriesError};

/// Parses a query-string instant: all digits are epoch seconds, anything else
/// must be an RFC 3339 date-time.
pub fn parse_timestamp(input: &str) -> Result<Timestamp> {
    let input = input.trim();
    let malformed = || SeriesError::MalformedInput(format!("Unable to parse '{}' as date-time", input));

    if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        let seconds: i64 = input.parse().map_err(|_| malformed())?;
        return Ok(Timestamp::from_epoch_seconds(seconds));
    }

    DateTime::parse_from_rfc3339(input)
        .map(|dt| Timestamp::from_epoch_millis(dt.timestamp_millis()))
        .map_err(|_| malformed())
}

/// Optional `start`/`end` query parameters of a range query.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeParams {
    /// Resolves the requested range. `end` defaults to `now` and `start` to
    /// `window` before `end`.
    pub fn resolve(&self, now: Timestamp, window: Duration) -> Result<(Timestamp, Timestamp)> {
        let end = match &self.end {
            Some(raw) => parse_timestamp(raw)?,
            None => now,
        };
        let start = match &self.start {
            Some(raw) => parse_timestamp(raw)?,
            None => end.minus(window),
        };

        if start > end {
            return Err(SeriesError::MalformedInput(format!(
                "start ({}) is after end ({})",
                start, end
            )));
        }
        Ok((start, end))
    }
}
