//! Per-second rate of change for counter-like metrics.
//!
//! The transform is a scan over time-ordered rows: [`RateState`] carries the
//! last raw sample seen for each metric, and [`Rate`] pulls rows from its input
//! and threads them through that state. The adapter consumes its input, so a
//! pass cannot be restarted; out-of-order rows are not detected and produce
//! wrong deltas.

use std::collections::HashMap;
use std::iter::FusedIterator;

use crate::models::{MetricType, Sample, ValueType};
use crate::results::Row;

/// Scan state for a rate pass: the metrics to convert and the most recent raw
/// sample seen for each of them.
#[derive(Debug, Clone, Default)]
pub struct RateState {
    metrics: Vec<String>,
    previous: HashMap<String, Sample>,
}

impl RateState {
    pub fn new<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metrics: metrics.into_iter().map(Into::into).collect(),
            previous: HashMap::new(),
        }
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Converts one row. Only the configured metrics appear in the output; a
    /// metric's first occurrence carries no value. A sample without a value
    /// rates to no value and leaves the previous sample in place.
    pub fn apply(&mut self, row: Row<Sample>) -> Row<Sample> {
        let mut result = Row::new(row.timestamp(), row.resource());

        for name in &self.metrics {
            if let Some(sample) = row.element(name) {
                result.add_element(self.rate_of(sample));
                if sample.value.is_some() {
                    self.previous.insert(sample.name.clone(), sample.clone());
                }
            }
        }

        result
    }

    fn rate_of(&self, sample: &Sample) -> Sample {
        let value = self
            .previous
            .get(&sample.name)
            .and_then(|previous| per_second(previous, sample));

        Sample::new(
            sample.timestamp,
            sample.resource.clone(),
            sample.name.clone(),
            MetricType::Gauge,
            value,
        )
    }
}

fn per_second(previous: &Sample, current: &Sample) -> Option<ValueType> {
    let elapsed = current.timestamp.as_seconds() - previous.timestamp.as_seconds();
    if elapsed <= 0 {
        return None;
    }

    let (cur, prev) = (current.value?, previous.value?);
    Some(cur.delta(&prev).divide_by(elapsed))
}

/// Iterator adapter yielding rate-converted rows.
#[derive(Debug)]
pub struct Rate<I> {
    input: I,
    state: RateState,
}

impl<I> Rate<I>
where
    I: Iterator<Item = Row<Sample>>,
{
    pub fn new<R>(input: R, state: RateState) -> Self
    where
        R: IntoIterator<IntoIter = I>,
    {
        Self {
            input: input.into_iter(),
            state,
        }
    }

    /// The scan state as it stands after the rows pulled so far.
    pub fn state(&self) -> &RateState {
        &self.state
    }
}

impl<I> Iterator for Rate<I>
where
    I: Iterator<Item = Row<Sample>>,
{
    type Item = Row<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.input.next()?;
        Some(self.state.apply(row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.input.size_hint()
    }
}

impl<I> FusedIterator for Rate<I> where I: FusedIterator<Item = Row<Sample>> {}

pub trait RateExt: Iterator<Item = Row<Sample>> + Sized {
    /// Converts the named metrics to per-second gauges, dropping every other
    /// element.
    fn rate<S: Into<String>>(self, metrics: impl IntoIterator<Item = S>) -> Rate<Self> {
        Rate::new(self, RateState::new(metrics))
    }
}

impl<I> RateExt for I where I: Iterator<Item = Row<Sample>> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Results;
    use crate::time::Timestamp;
    use pretty_assertions::assert_eq;

    fn counter(seconds: i64, name: &str, value: u64) -> Sample {
        Sample::new(
            Timestamp::from_epoch_seconds(seconds),
            "localhost",
            name,
            MetricType::Counter,
            Some(ValueType::Counter(value)),
        )
    }

    #[test]
    fn test_rate_per_second() {
        let results: Results<Sample> =
            vec![counter(0, "ifInOctets", 1000), counter(10, "ifInOctets", 2000)]
                .into_iter()
                .collect();

        let rows: Vec<Row<Sample>> = results.into_iter().rate(["ifInOctets"]).collect();
        assert_eq!(rows.len(), 2);

        let first = rows[0].element("ifInOctets").unwrap();
        assert_eq!(first.metric_type, MetricType::Gauge);
        assert_eq!(first.value, None);

        let second = rows[1].element("ifInOctets").unwrap();
        assert_eq!(second.metric_type, MetricType::Gauge);
        assert_eq!(second.value, Some(ValueType::Gauge(100.0)));
        assert_eq!(second.timestamp, Timestamp::from_epoch_seconds(10));
        assert_eq!(second.resource, "localhost");
    }

    #[test]
    fn test_unlisted_metrics_are_dropped() {
        let results: Results<Sample> = vec![
            counter(0, "ifInOctets", 0),
            counter(0, "ifOutOctets", 0),
            counter(5, "ifInOctets", 50),
            counter(5, "ifOutOctets", 500),
        ]
        .into_iter()
        .collect();

        let rows: Vec<Row<Sample>> = results.into_iter().rate(["ifOutOctets"]).collect();
        assert!(rows.iter().all(|row| row.len() == 1));
        assert!(rows.iter().all(|row| row.element("ifInOctets").is_none()));
        assert_eq!(
            rows[1].element("ifOutOctets").unwrap().value,
            Some(ValueType::Gauge(100.0))
        );
    }

    #[test]
    fn test_gap_in_metric_uses_last_seen_sample() {
        let results: Results<Sample> = vec![
            counter(0, "a", 0),
            counter(10, "b", 7),
            counter(20, "a", 400),
        ]
        .into_iter()
        .collect();

        let rows: Vec<Row<Sample>> = results.into_iter().rate(["a", "b"]).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].element("a").is_none());
        assert_eq!(rows[1].element("b").unwrap().value, None);
        assert_eq!(rows[2].element("a").unwrap().value, Some(ValueType::Gauge(20.0)));
    }

    #[test]
    fn test_missing_value_keeps_previous_sample() {
        let missing = Sample::new(
            Timestamp::from_epoch_seconds(10),
            "localhost",
            "c",
            MetricType::Counter,
            None,
        );
        let results: Results<Sample> = vec![counter(0, "c", 0), missing, counter(20, "c", 200)]
            .into_iter()
            .collect();

        let values: Vec<Option<ValueType>> = results
            .into_iter()
            .rate(["c"])
            .map(|row| row.element("c").unwrap().value)
            .collect();
        assert_eq!(values, vec![None, None, Some(ValueType::Gauge(10.0))]);
    }

    #[test]
    fn test_counter_wrap() {
        let rows: Vec<Row<Sample>> = vec![counter(0, "c", u64::MAX - 99), counter(10, "c", 900)]
            .into_iter()
            .collect::<Results<Sample>>()
            .into_iter()
            .rate(["c"])
            .collect();

        assert_eq!(rows[1].element("c").unwrap().value, Some(ValueType::Gauge(100.0)));
    }

    #[test]
    fn test_sub_second_spacing_has_no_rate() {
        let results: Results<Sample> = vec![
            counter(1, "c", 10),
            Sample::new(
                Timestamp::from_epoch_millis(1500),
                "localhost",
                "c",
                MetricType::Counter,
                Some(ValueType::Counter(20)),
            ),
        ]
        .into_iter()
        .collect();

        let rows: Vec<Row<Sample>> = results.into_iter().rate(["c"]).collect();
        assert_eq!(rows[1].element("c").unwrap().value, None);
    }

    #[test]
    fn test_state_is_carried_across_pulls() {
        let results: Results<Sample> = vec![counter(0, "c", 1), counter(1, "c", 2)]
            .into_iter()
            .collect();

        let mut rate = Rate::new(results, RateState::new(["c"]));
        assert_eq!(rate.state().metrics(), ["c"]);
        assert!(rate.next().is_some());
        assert!(rate.next().is_some());
        assert!(rate.next().is_none());
        assert!(rate.next().is_none());
    }
}
