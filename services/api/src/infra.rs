use client_map::config::AppConfig;
use client_map::workflows::client_map::{
    ClientMapPipeline, DataFetchError, GeocodingProvider, HttpRemoteSource, OpenCageProvider,
    PipelineCaches, PipelineRun, RegionCount, RegionSelection, RemoteSource,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::Mutex;

pub(crate) type MapPipeline =
    ClientMapPipeline<Arc<dyn RemoteSource>, Arc<dyn GeocodingProvider>>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) maps: Arc<MapService>,
}

/// The pipeline and its caches. One run at a time holds the caches.
pub(crate) struct MapService {
    pipeline: MapPipeline,
    caches: Mutex<PipelineCaches>,
}

impl MapService {
    pub(crate) fn new(pipeline: MapPipeline) -> Self {
        Self {
            pipeline,
            caches: Mutex::new(PipelineCaches::default()),
        }
    }

    /// Pipeline backed by the live client source and OpenCage, sharing one HTTP client.
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        let client = reqwest::Client::new();
        let remote: Arc<dyn RemoteSource> = Arc::new(HttpRemoteSource::new(client.clone()));
        let geocoder: Arc<dyn GeocodingProvider> = Arc::new(OpenCageProvider::new(
            client,
            config.geocoder.endpoint.clone(),
            config.geocoder.api_key.clone(),
        ));
        Self::new(ClientMapPipeline::new(
            remote,
            geocoder,
            config.pipeline_settings(),
        ))
    }

    pub(crate) fn title(&self) -> &str {
        &self.pipeline.settings().map.title
    }

    pub(crate) async fn run(
        &self,
        selection: &RegionSelection,
    ) -> Result<PipelineRun, DataFetchError> {
        let mut caches = self.caches.lock().await;
        self.pipeline.run(selection, &mut caches).await
    }

    /// Region labels of the client list, if a previous run already loaded it.
    pub(crate) async fn cached_regions(&self) -> Vec<String> {
        let caches = self.caches.lock().await;
        caches
            .datasets
            .get(&self.pipeline.settings().clients_url)
            .map(|dataset| dataset.regions())
            .unwrap_or_default()
    }

    pub(crate) async fn region_counts(&self) -> Result<Vec<RegionCount>, DataFetchError> {
        let mut caches = self.caches.lock().await;
        let dataset = self.pipeline.load_dataset(&mut caches).await?;
        Ok(dataset.region_counts())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use client_map::workflows::client_map::{
        Coordinate, EmptySelectionPolicy, GeocodeFailurePolicy, GeocodeLookupFailure,
        MapSettings, PipelineSettings,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::collections::HashMap;

    pub(crate) const CLIENTS_URL: &str = "https://example.test/clients.csv";
    pub(crate) const BOUNDARIES_URL: &str = "https://example.test/regions.geojson";

    pub(crate) struct StaticRemote {
        documents: HashMap<&'static str, &'static str>,
    }

    #[async_trait]
    impl RemoteSource for StaticRemote {
        async fn fetch_text(&self, url: &str) -> Result<String, DataFetchError> {
            self.documents
                .get(url)
                .map(|document| document.to_string())
                .ok_or_else(|| DataFetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    pub(crate) struct StaticGeocoder;

    #[async_trait]
    impl GeocodingProvider for StaticGeocoder {
        async fn lookup(&self, address: &str) -> Result<Coordinate, GeocodeLookupFailure> {
            match address {
                "1 Rue X, Paris" => Coordinate::new(48.85, 2.35),
                "2 Rue Y, Lyon" => Coordinate::new(45.76, 4.84),
                _ => None,
            }
            .ok_or(GeocodeLookupFailure::NoMatch)
        }
    }

    pub(crate) const EMPTY_BOUNDARIES: &str = r#"{"type":"FeatureCollection","features":[]}"#;

    /// A `None` document leaves that URL unreachable.
    pub(crate) fn map_service(
        clients_csv: Option<&'static str>,
        boundaries: Option<&'static str>,
    ) -> MapService {
        let documents = [(CLIENTS_URL, clients_csv), (BOUNDARIES_URL, boundaries)]
            .into_iter()
            .filter_map(|(url, document)| document.map(|body| (url, body)))
            .collect::<HashMap<_, _>>();
        let remote: Arc<dyn RemoteSource> = Arc::new(StaticRemote { documents });
        let geocoder: Arc<dyn GeocodingProvider> = Arc::new(StaticGeocoder);
        let settings = PipelineSettings {
            clients_url: CLIENTS_URL.to_string(),
            boundaries_url: BOUNDARIES_URL.to_string(),
            empty_selection: EmptySelectionPolicy::RequireSelection,
            geocode_failures: GeocodeFailurePolicy::Silent,
            map: MapSettings::default(),
        };
        MapService::new(ClientMapPipeline::new(remote, geocoder, settings))
    }

    pub(crate) fn app_state(
        clients_csv: Option<&'static str>,
        boundaries: Option<&'static str>,
    ) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(recorder.handle()),
            maps: Arc::new(map_service(clients_csv, boundaries)),
        }
    }
}
