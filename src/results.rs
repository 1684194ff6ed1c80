//! Assembly of elements into timestamp-aligned rows.
//!
//! `Results` partitions elements by their own timestamp and keeps the rows in
//! ascending time order. Sequential consumers such as `query::Rate` rely on
//! that ordering.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::hash_map::{self, HashMap};

use crate::time::Timestamp;

/// Anything that can be placed into a `Row`.
pub trait Element {
    fn timestamp(&self) -> Timestamp;
    fn resource(&self) -> &str;
    fn name(&self) -> &str;
}

/// The elements sharing one timestamp, keyed by element name.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<T> {
    timestamp: Timestamp,
    resource: String,
    cells: HashMap<String, T>,
}

impl<T: Element> Row<T> {
    pub fn new(timestamp: Timestamp, resource: impl Into<String>) -> Self {
        Self {
            timestamp,
            resource: resource.into(),
            cells: HashMap::new(),
        }
    }

    /// Stores `element` under its name, replacing any element of the same name.
    pub fn add_element(&mut self, element: T) {
        self.cells.insert(element.name().to_string(), element);
    }

    pub fn element(&self, name: &str) -> Option<&T> {
        self.cells.get(name)
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn elements(&self) -> hash_map::Values<'_, String, T> {
        self.cells.values()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a Row<T> {
    type Item = &'a T;
    type IntoIter = hash_map::Values<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.values()
    }
}

impl<T> IntoIterator for Row<T> {
    type Item = T;
    type IntoIter = hash_map::IntoValues<String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_values()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Results<T> {
    rows: BTreeMap<Timestamp, Row<T>>,
}

impl<T> Default for Results<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Element> Results<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `element` to the row for its timestamp, creating the row if needed.
    /// A new row takes its resource from the first element placed in it.
    pub fn add_element(&mut self, element: T) {
        let timestamp = element.timestamp();
        self.rows
            .entry(timestamp)
            .or_insert_with(|| Row::new(timestamp, element.resource()))
            .add_element(element);
    }

    /// Inserts a whole row, replacing any row with the same timestamp.
    pub fn add_row(&mut self, row: Row<T>) {
        self.rows.insert(row.timestamp(), row);
    }

    pub fn row(&self, timestamp: &Timestamp) -> Option<&Row<T>> {
        self.rows.get(timestamp)
    }

    /// Rows in ascending timestamp order.
    pub fn rows(&self) -> btree_map::Values<'_, Timestamp, Row<T>> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: Element> FromIterator<T> for Results<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut results = Results::new();
        for element in iter {
            results.add_element(element);
        }
        results
    }
}

impl<T: Element> Extend<T> for Results<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.add_element(element);
        }
    }
}

impl<'a, T> IntoIterator for &'a Results<T> {
    type Item = &'a Row<T>;
    type IntoIter = btree_map::Values<'a, Timestamp, Row<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.values()
    }
}

impl<T> IntoIterator for Results<T> {
    type Item = Row<T>;
    type IntoIter = btree_map::IntoValues<Timestamp, Row<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricType, Sample, ValueType};
    use pretty_assertions::assert_eq;

    fn sample(seconds: i64, resource: &str, name: &str, value: u64) -> Sample {
        Sample::new(
            Timestamp::from_epoch_seconds(seconds),
            resource,
            name,
            MetricType::Counter,
            Some(ValueType::Counter(value)),
        )
    }

    #[test]
    fn test_same_timestamp_merges_into_one_row() {
        let mut results = Results::new();
        results.add_element(sample(10, "host1", "ifInOctets", 1));
        results.add_element(sample(10, "host2", "ifOutOctets", 2));

        assert_eq!(results.len(), 1);
        let row = results.rows().next().unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row.resource(), "host1");
        assert!(row.element("ifInOctets").is_some());
        assert!(row.element("ifOutOctets").is_some());
    }

    #[test]
    fn test_rows_are_ordered_by_timestamp() {
        let mut results = Results::new();
        results.add_element(sample(30, "host1", "m", 3));
        results.add_element(sample(10, "host1", "m", 1));
        results.add_element(sample(20, "host1", "m", 2));

        let seconds: Vec<i64> = results.rows().map(|r| r.timestamp().as_seconds()).collect();
        assert_eq!(seconds, vec![10, 20, 30]);
    }

    #[test]
    fn test_duplicate_name_last_write_wins() {
        let mut results = Results::new();
        results.add_element(sample(10, "host1", "m", 1));
        results.add_element(sample(10, "host1", "m", 5));

        let row = results.row(&Timestamp::from_epoch_seconds(10)).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row.element("m").unwrap().value, Some(ValueType::Counter(5)));
    }

    #[test]
    fn test_unit_normalized_rows() {
        let mut results = Results::new();
        results.add_element(sample(1, "host1", "a", 1));
        results.add_element(Sample::new(
            Timestamp::from_epoch_millis(1000),
            "host1",
            "b",
            MetricType::Gauge,
            Some(ValueType::Gauge(0.5)),
        ));

        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_collect_and_consume() {
        let results: Results<Sample> = vec![sample(20, "h", "m", 2), sample(10, "h", "m", 1)]
            .into_iter()
            .collect();

        let values: Vec<Option<ValueType>> = results
            .into_iter()
            .flat_map(|row| row.into_iter())
            .map(|s| s.value)
            .collect();
        assert_eq!(values, vec![Some(ValueType::Counter(1)), Some(ValueType::Counter(2))]);
    }
}
