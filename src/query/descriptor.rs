use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time::Duration;
use crate::{Result, SeriesError};

/// The default step size in milliseconds.
pub const DEFAULT_STEP_MILLIS: i64 = 300_000;

/// Multiple of the step size used as a datasource's default heartbeat.
pub const DEFAULT_HEARTBEAT_MULTIPLIER: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFunction {
    Average,
    Minimum,
    Maximum,
}

impl AggregateFunction {
    /// Reduces a window of values. Non-finite values are skipped; an empty
    /// window has no result.
    pub fn apply<I>(&self, values: I) -> Option<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0u64;
        let mut sum = 0.0;
        let mut min = f64::MAX;
        let mut max = f64::MIN;

        for value in values.into_iter().filter(|v| v.is_finite()) {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        if count == 0 {
            return None;
        }

        Some(match self {
            AggregateFunction::Average => sum / count as f64,
            AggregateFunction::Minimum => min,
            AggregateFunction::Maximum => max,
        })
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateFunction::Average => "AVERAGE",
            AggregateFunction::Minimum => "MINIMUM",
            AggregateFunction::Maximum => "MAXIMUM",
        };
        write!(f, "{}", name)
    }
}

/// A raw series read from storage by metric name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datasource {
    pub label: String,
    pub source: String,
    /// Largest gap between samples before the value is treated as unknown.
    pub heartbeat: Duration,
}

impl Datasource {
    pub fn new(label: impl Into<String>, source: impl Into<String>, heartbeat: Duration) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            heartbeat,
        }
    }
}

/// A computed series derived from one declared datasource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub label: String,
    pub source: String,
}

impl Aggregate {
    pub fn new(function: AggregateFunction, label: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            function,
            label: label.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Datasource,
    Aggregate,
}

/// A validated description of the series a query produces.
///
/// Built through [`ResultDescriptorBuilder`]; every label is unique, every
/// aggregate reads from a datasource declared before it, and every export
/// names a declared label.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultDescriptor {
    step: Duration,
    datasources: Vec<Datasource>,
    aggregates: Vec<Aggregate>,
    sources: HashMap<String, SourceKind>,
    labels: Vec<String>,
    exports: HashSet<String>,
}

impl Default for ResultDescriptor {
    fn default() -> Self {
        Self::with_step(Duration::millis(DEFAULT_STEP_MILLIS))
    }
}

impl ResultDescriptor {
    fn with_step(step: Duration) -> Self {
        Self {
            step,
            datasources: Vec::new(),
            aggregates: Vec::new(),
            sources: HashMap::new(),
            labels: Vec::new(),
            exports: HashSet::new(),
        }
    }

    pub fn builder() -> ResultDescriptorBuilder {
        ResultDescriptorBuilder::default()
    }

    pub fn builder_with_step(step: Duration) -> ResultDescriptorBuilder {
        ResultDescriptorBuilder {
            draft: Self::with_step(step),
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Datasources in declaration order.
    pub fn datasources(&self) -> &[Datasource] {
        &self.datasources
    }

    pub fn datasource(&self, label: &str) -> Option<&Datasource> {
        self.datasources.iter().find(|ds| ds.label == label)
    }

    /// Aggregates in declaration order.
    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    pub fn aggregate(&self, label: &str) -> Option<&Aggregate> {
        self.aggregates.iter().find(|agg| agg.label == label)
    }

    pub fn sources(&self) -> &HashMap<String, SourceKind> {
        &self.sources
    }

    /// Every declared label, datasources and aggregates interleaved in
    /// declaration order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn exports(&self) -> &HashSet<String> {
        &self.exports
    }

    /// Labels a query should return: the exports in declaration order, or
    /// every label when nothing was exported.
    pub fn exported_labels(&self) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|label| self.exports.is_empty() || self.exports.contains(label.as_str()))
            .map(String::as_str)
            .collect()
    }

    fn claim(&mut self, label: &str, kind: SourceKind) -> Result<()> {
        if self.sources.contains_key(label) {
            return Err(SeriesError::DuplicateLabel(label.to_string()));
        }
        self.sources.insert(label.to_string(), kind);
        self.labels.push(label.to_string());
        Ok(())
    }

    fn check_sources<'a, I>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let missing: HashSet<&str> = names
            .into_iter()
            .filter(|name| !self.sources.contains_key(*name))
            .collect();

        if !missing.is_empty() {
            return Err(SeriesError::unknown_sources(missing));
        }
        Ok(())
    }

    fn add_datasource(&mut self, ds: Datasource) -> Result<()> {
        self.claim(&ds.label, SourceKind::Datasource)?;
        self.datasources.push(ds);
        Ok(())
    }

    fn add_aggregate(&mut self, aggregate: Aggregate) -> Result<()> {
        if self.sources.contains_key(&aggregate.label) {
            return Err(SeriesError::DuplicateLabel(aggregate.label));
        }
        self.check_sources([aggregate.source.as_str()])?;
        if self.sources.get(&aggregate.source) == Some(&SourceKind::Aggregate) {
            return Err(SeriesError::InvalidSource {
                label: aggregate.label,
                source_label: aggregate.source,
            });
        }

        self.claim(&aggregate.label, SourceKind::Aggregate)?;
        self.aggregates.push(aggregate);
        Ok(())
    }

    /// Re-checks every cross-field invariant from scratch.
    fn validate(&self) -> Result<()> {
        let mut seen: HashMap<&str, SourceKind> = HashMap::new();

        for label in &self.labels {
            let kind = *self
                .sources
                .get(label)
                .ok_or_else(|| SeriesError::unknown_sources([label.as_str()]))?;

            if kind == SourceKind::Aggregate {
                let aggregate = self
                    .aggregate(label)
                    .ok_or_else(|| SeriesError::unknown_sources([label.as_str()]))?;
                match seen.get(aggregate.source.as_str()) {
                    Some(SourceKind::Datasource) => {}
                    Some(SourceKind::Aggregate) => {
                        return Err(SeriesError::InvalidSource {
                            label: aggregate.label.clone(),
                            source_label: aggregate.source.clone(),
                        })
                    }
                    None => return Err(SeriesError::unknown_sources([aggregate.source.as_str()])),
                }
            }

            if seen.insert(label.as_str(), kind).is_some() {
                return Err(SeriesError::DuplicateLabel(label.clone()));
            }
        }

        if seen.len() != self.datasources.len() + self.aggregates.len() {
            return Err(SeriesError::Internal(
                "descriptor label index out of sync with its sources".to_string(),
            ));
        }

        self.check_sources(self.exports.iter().map(String::as_str))
    }
}

/// Step-by-step construction of a [`ResultDescriptor`].
///
/// Each call consumes the builder and hands it back only if the declaration
/// was valid, so a failed call cannot leave a half-updated draft behind.
#[derive(Debug, Clone, Default)]
pub struct ResultDescriptorBuilder {
    draft: ResultDescriptor,
}

impl ResultDescriptorBuilder {
    pub fn step(mut self, step: Duration) -> Self {
        self.draft.step = step;
        self
    }

    pub fn step_millis(self, step: i64) -> Self {
        self.step(Duration::millis(step))
    }

    /// Declares a datasource labelled after the metric it reads.
    pub fn datasource_for(self, metric_name: &str) -> Result<Self> {
        self.datasource(metric_name, metric_name)
    }

    /// Declares a datasource with a heartbeat of twice the current step.
    pub fn datasource(self, label: &str, metric_name: &str) -> Result<Self> {
        let heartbeat = self.draft.step.times(DEFAULT_HEARTBEAT_MULTIPLIER);
        self.datasource_with_heartbeat(label, metric_name, heartbeat)
    }

    pub fn datasource_with_heartbeat(
        mut self,
        label: &str,
        metric_name: &str,
        heartbeat: Duration,
    ) -> Result<Self> {
        self.draft
            .add_datasource(Datasource::new(label, metric_name, heartbeat))?;
        Ok(self)
    }

    pub fn average(self, label: &str, source: &str) -> Result<Self> {
        self.aggregate(Aggregate::new(AggregateFunction::Average, label, source))
    }

    pub fn min(self, label: &str, source: &str) -> Result<Self> {
        self.aggregate(Aggregate::new(AggregateFunction::Minimum, label, source))
    }

    pub fn max(self, label: &str, source: &str) -> Result<Self> {
        self.aggregate(Aggregate::new(AggregateFunction::Maximum, label, source))
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Result<Self> {
        self.draft.add_aggregate(aggregate)?;
        Ok(self)
    }

    /// Marks labels for inclusion in query output.
    pub fn export(mut self, labels: &[&str]) -> Result<Self> {
        self.draft.check_sources(labels.iter().copied())?;
        self.draft
            .exports
            .extend(labels.iter().map(|label| label.to_string()));
        Ok(self)
    }

    pub fn build(self) -> Result<ResultDescriptor> {
        self.draft.validate()?;
        debug!(
            "Built result descriptor: step={}, datasources={}, aggregates={}, exports={}",
            self.draft.step,
            self.draft.datasources.len(),
            self.draft.aggregates.len(),
            self.draft.exports.len()
        );
        Ok(self.draft)
    }
}
