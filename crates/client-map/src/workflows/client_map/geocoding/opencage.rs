use super::{GeocodeLookupFailure, GeocodingProvider};
use crate::workflows::client_map::domain::{ApiKey, Coordinate};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

/// Forward geocoding through the OpenCage REST API.
#[derive(Debug, Clone)]
pub struct OpenCageProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: ApiKey,
}

#[derive(Debug, Deserialize)]
struct OpenCageResponse {
    #[serde(default)]
    results: Vec<OpenCageResult>,
}

#[derive(Debug, Deserialize)]
struct OpenCageResult {
    geometry: OpenCageGeometry,
}

#[derive(Debug, Deserialize)]
struct OpenCageGeometry {
    lat: f64,
    lng: f64,
}

impl OpenCageProvider {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    fn request_url(&self, address: &str) -> Result<Url, GeocodeLookupFailure> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("q", address),
                ("key", self.api_key.expose()),
                ("limit", "1"),
                ("no_annotations", "1"),
            ],
        )
        .map_err(|err| GeocodeLookupFailure::Transport(format!("invalid endpoint: {err}")))
    }
}

fn first_coordinate(response: OpenCageResponse) -> Result<Coordinate, GeocodeLookupFailure> {
    let result = response
        .results
        .into_iter()
        .next()
        .ok_or(GeocodeLookupFailure::NoMatch)?;
    Coordinate::new(result.geometry.lat, result.geometry.lng).ok_or_else(|| {
        GeocodeLookupFailure::Malformed("coordinate out of range".to_string())
    })
}

#[async_trait]
impl GeocodingProvider for OpenCageProvider {
    async fn lookup(&self, address: &str) -> Result<Coordinate, GeocodeLookupFailure> {
        let url = self.request_url(address)?;

        // Errors are stripped of their URL so the key never reaches a log line.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| GeocodeLookupFailure::Transport(err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeLookupFailure::Status(status.as_u16()));
        }

        let body: OpenCageResponse = response
            .json()
            .await
            .map_err(|err| GeocodeLookupFailure::Malformed(err.without_url().to_string()))?;

        first_coordinate(body)
    }
}
