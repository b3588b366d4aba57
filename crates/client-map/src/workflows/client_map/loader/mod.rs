mod parser;

use super::domain::ClientRecord;
use super::remote::{DataFetchError, RemoteSource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info};

pub use parser::{ADDRESS_COLUMN, NAME_COLUMN, REGION_COLUMN};

/// Snapshot of the client list as fetched from one source URL.
#[derive(Debug, Clone)]
pub struct ClientDataset {
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
    pub records: Vec<ClientRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionCount {
    pub region: String,
    pub clients: usize,
}

impl ClientDataset {
    pub fn from_csv(
        source_url: impl Into<String>,
        csv: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, DataFetchError> {
        let records = parser::parse_clients(Cursor::new(csv.as_bytes()))?;
        Ok(Self {
            source_url: source_url.into(),
            fetched_at,
            records,
        })
    }

    /// Distinct non-empty region labels, sorted.
    pub fn regions(&self) -> Vec<String> {
        self.region_counts()
            .into_iter()
            .map(|count| count.region)
            .collect()
    }

    pub fn region_counts(&self) -> Vec<RegionCount> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for region in self.records.iter().filter_map(|record| record.region.as_deref()) {
            *counts.entry(region).or_default() += 1;
        }

        counts
            .into_iter()
            .map(|(region, clients)| RegionCount {
                region: region.to_string(),
                clients,
            })
            .collect()
    }
}

/// Memoized datasets keyed by source URL, kept for the process lifetime.
#[derive(Debug, Default)]
pub struct DatasetCache {
    snapshots: HashMap<String, Arc<ClientDataset>>,
}

impl DatasetCache {
    pub fn get(&self, url: &str) -> Option<Arc<ClientDataset>> {
        self.snapshots.get(url).cloned()
    }

    pub fn insert(&mut self, dataset: ClientDataset) -> Arc<ClientDataset> {
        let dataset = Arc::new(dataset);
        self.snapshots
            .insert(dataset.source_url.clone(), Arc::clone(&dataset));
        dataset
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Returns the cached snapshot for `url`, fetching and parsing it on first use.
/// Failed loads are not cached.
pub async fn load_clients<R>(
    remote: &R,
    url: &str,
    cache: &mut DatasetCache,
) -> Result<Arc<ClientDataset>, DataFetchError>
where
    R: RemoteSource + ?Sized,
{
    if let Some(dataset) = cache.get(url) {
        debug!(%url, records = dataset.records.len(), "client dataset served from cache");
        return Ok(dataset);
    }

    let body = remote.fetch_text(url).await?;
    let dataset = ClientDataset::from_csv(url, &body, Utc::now())?;
    info!(%url, records = dataset.records.len(), "client dataset loaded");
    Ok(cache.insert(dataset))
}
