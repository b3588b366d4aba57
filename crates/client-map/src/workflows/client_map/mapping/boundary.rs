use super::super::remote::{DataFetchError, RemoteSource};
use geojson::GeoJson;
use tracing::info;

/// Region polygons drawn under the markers. Passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySet {
    document: serde_json::Value,
    feature_count: usize,
}

impl BoundarySet {
    pub fn parse(raw: &str) -> Result<Self, DataFetchError> {
        let geojson = raw
            .parse::<GeoJson>()
            .map_err(|err| DataFetchError::GeoJson(err.to_string()))?;
        Self::from_geojson(&geojson)
    }

    pub fn from_geojson(geojson: &GeoJson) -> Result<Self, DataFetchError> {
        let feature_count = match geojson {
            GeoJson::FeatureCollection(collection) => collection.features.len(),
            GeoJson::Feature(_) | GeoJson::Geometry(_) => 1,
        };
        let document = serde_json::to_value(geojson)
            .map_err(|err| DataFetchError::GeoJson(err.to_string()))?;
        Ok(Self {
            document,
            feature_count,
        })
    }

    pub fn empty() -> Self {
        Self {
            document: serde_json::json!({ "type": "FeatureCollection", "features": [] }),
            feature_count: 0,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.document
    }
}

/// Fetches the boundary document. Not memoized; it is re-read on every run.
pub async fn load_boundaries<R>(remote: &R, url: &str) -> Result<BoundarySet, DataFetchError>
where
    R: RemoteSource + ?Sized,
{
    let raw = remote.fetch_text(url).await?;
    let boundaries = BoundarySet::parse(&raw)?;
    info!(%url, features = boundaries.feature_count(), "region boundaries loaded");
    Ok(boundaries)
}
