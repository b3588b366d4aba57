mod opencage;

use super::domain::{ClientRecord, Coordinate, GeocodeFailurePolicy, Notice, ResolvedClient};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub use opencage::OpenCageProvider;

/// Why a single address could not be resolved. Never fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeocodeLookupFailure {
    #[error("geocoding request failed: {0}")]
    Transport(String),
    #[error("geocoding service answered with HTTP status {0}")]
    Status(u16),
    #[error("geocoding response could not be decoded: {0}")]
    Malformed(String),
    #[error("no match for this address")]
    NoMatch,
}

/// Gateway to an external forward-geocoding service.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn lookup(&self, address: &str) -> Result<Coordinate, GeocodeLookupFailure>;
}

#[async_trait]
impl<T> GeocodingProvider for Arc<T>
where
    T: GeocodingProvider + ?Sized,
{
    async fn lookup(&self, address: &str) -> Result<Coordinate, GeocodeLookupFailure> {
        (**self).lookup(address).await
    }
}

/// Address to lookup outcome. `None` records a cached "not found".
#[derive(Debug, Default)]
pub struct GeocodeCache {
    entries: HashMap<String, Option<Coordinate>>,
}

impl GeocodeCache {
    pub fn get(&self, address: &str) -> Option<Option<Coordinate>> {
        self.entries.get(address).copied()
    }

    pub fn insert(&mut self, address: impl Into<String>, coordinate: Option<Coordinate>) {
        self.entries.insert(address.into(), coordinate);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResolution {
    pub coordinate: Option<Coordinate>,
    pub from_cache: bool,
    /// Set only when this call reached the provider and it failed.
    pub failure: Option<GeocodeLookupFailure>,
}

/// Resolves one address, consulting `cache` before the provider.
pub async fn resolve_address<P>(
    provider: &P,
    cache: &mut GeocodeCache,
    address: &str,
) -> GeocodeResolution
where
    P: GeocodingProvider + ?Sized,
{
    let key = address.trim();
    if let Some(coordinate) = cache.get(key) {
        debug!(found = coordinate.is_some(), "geocode cache hit");
        return GeocodeResolution {
            coordinate,
            from_cache: true,
            failure: None,
        };
    }

    let (coordinate, failure) = match provider.lookup(key).await {
        Ok(coordinate) => (Some(coordinate), None),
        Err(failure) => {
            warn!(error = %failure, "geocoding lookup failed");
            (None, Some(failure))
        }
    };
    cache.insert(key, coordinate);

    GeocodeResolution {
        coordinate,
        from_cache: false,
        failure,
    }
}

/// Records surviving the geocoding stage plus what was dropped on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeStage {
    pub resolved: Vec<ResolvedClient>,
    pub notices: Vec<Notice>,
    pub missing_address: usize,
    pub unresolved: usize,
    pub lookups: usize,
}

/// Attaches coordinates to `records` one at a time, in input order.
///
/// Records that already carry a coordinate keep it, with or without an address.
/// The others need an address: without one they are dropped before any lookup.
/// Unresolvable records are dropped; under
/// [`GeocodeFailurePolicy::Notify`] each one also produces a warning notice.
pub async fn geocode_records<P>(
    provider: &P,
    cache: &mut GeocodeCache,
    records: Vec<ClientRecord>,
    policy: GeocodeFailurePolicy,
) -> GeocodeStage
where
    P: GeocodingProvider + ?Sized,
{
    let mut stage = GeocodeStage::default();

    for record in records {
        let coordinate = match record.coordinate {
            Some(coordinate) => Some(coordinate),
            None => {
                let address = match record.address.as_deref() {
                    Some(address) if record.has_address() => address,
                    _ => {
                        stage.missing_address += 1;
                        continue;
                    }
                };

                let resolution = resolve_address(provider, cache, address).await;
                if !resolution.from_cache {
                    stage.lookups += 1;
                }
                if resolution.coordinate.is_none() && policy == GeocodeFailurePolicy::Notify {
                    let reason = resolution
                        .failure
                        .map(|failure| format!(": {failure}"))
                        .unwrap_or_default();
                    stage.notices.push(Notice::warning(format!(
                        "Could not locate {} ({address}){reason}",
                        record.name
                    )));
                }
                resolution.coordinate
            }
        };

        match coordinate {
            Some(coordinate) => stage.resolved.push(ResolvedClient {
                row: record.row,
                name: record.name,
                address: record.address.filter(|address| !address.trim().is_empty()),
                region: record.region,
                coordinate,
            }),
            None => stage.unresolved += 1,
        }
    }

    if stage.missing_address > 0 && policy == GeocodeFailurePolicy::Notify {
        stage.notices.push(Notice::warning(format!(
            "{} client(s) without an address were skipped",
            stage.missing_address
        )));
    }

    stage
}
