use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::{
    metrics,
    models::{Resource, Sample},
    results::Results,
    time::Timestamp,
    Result,
};

/// Persistence for raw samples.
///
/// `select` returns rows in ascending timestamp order; rate conversion and the
/// HTTP layer depend on it.
#[async_trait]
pub trait SampleRepository: Send + Sync {
    async fn insert(&self, samples: Vec<Sample>) -> Result<()>;

    /// Samples for `resource` with `start <= timestamp <= end`.
    async fn select(&self, resource: &str, start: Timestamp, end: Timestamp)
        -> Result<Results<Sample>>;
}

/// In-process repository keeping every sample in memory.
#[derive(Clone, Default)]
pub struct MemorySampleRepository {
    state: Arc<RwLock<InnerState>>,
}

#[derive(Default)]
struct InnerState {
    series: HashMap<String, BTreeMap<(Timestamp, String), Sample>>,
    resources: HashSet<Resource>,
    stored: usize,
}

impl MemorySampleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every resource a sample has been inserted for, ordered by id.
    pub fn resources(&self) -> Vec<Resource> {
        let state = self.state.read();
        let mut resources: Vec<Resource> = state.resources.iter().cloned().collect();
        resources.sort_by(|a, b| a.id().cmp(b.id()));
        resources
    }

    pub fn len(&self) -> usize {
        self.state.read().stored
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SampleRepository for MemorySampleRepository {
    async fn insert(&self, samples: Vec<Sample>) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let count = samples.len();
        let mut state = self.state.write();
        for sample in samples {
            state.resources.insert(Resource::new(sample.resource.as_str()));

            let key = (sample.timestamp, sample.name.clone());
            let replaced = state
                .series
                .entry(sample.resource.clone())
                .or_default()
                .insert(key, sample);
            if replaced.is_none() {
                state.stored += 1;
            }
        }

        debug!("Inserted {} samples ({} stored)", count, state.stored);
        metrics::record_samples_inserted(count, state.stored);
        Ok(())
    }

    async fn select(
        &self,
        resource: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Results<Sample>> {
        let state = self.state.read();
        let mut results = Results::new();

        if let Some(series) = state.series.get(resource) {
            results.extend(
                series
                    .range((start, String::new())..)
                    .take_while(|((timestamp, _), _)| *timestamp <= end)
                    .map(|(_, sample)| sample.clone()),
            );
        }

        debug!(
            "Selected {} rows for {} in [{}, {}]",
            results.len(),
            resource,
            start,
            end
        );
        Ok(results)
    }
}
