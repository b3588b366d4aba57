use super::domain::{
    EmptyResultState, EmptySelectionPolicy, GeocodeFailurePolicy, Notice, RegionSelection,
    ResolvedClient,
};
use super::filter::{filter_by_regions, FilterOutcome};
use super::geocoding::{geocode_records, GeocodeCache, GeocodingProvider};
use super::loader::{load_clients, ClientDataset, DatasetCache};
use super::mapping::{build_map, load_boundaries, ClientMap, MapSettings};
use super::remote::{DataFetchError, RemoteSource};
use super::report::{
    render_map_document, table_rows, ClientRowView, ClientTableView, ExportArtifact, MapDocument,
    RunStatus,
};
use std::sync::Arc;
use tracing::info;

/// Per-deployment inputs of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub clients_url: String,
    pub boundaries_url: String,
    pub empty_selection: EmptySelectionPolicy,
    pub geocode_failures: GeocodeFailurePolicy,
    pub map: MapSettings,
}

/// The two memoization stores shared by successive runs.
#[derive(Debug, Default)]
pub struct PipelineCaches {
    pub datasets: DatasetCache,
    pub geocodes: GeocodeCache,
}

/// A rendered map together with the records it shows.
#[derive(Debug, Clone)]
pub struct MapView {
    pub map: ClientMap,
    pub document: MapDocument,
    pub clients: Vec<ResolvedClient>,
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    AwaitingSelection,
    Empty(EmptyResultState),
    Ready(MapView),
}

/// Result of one run: the dataset it used, the selection and what to show.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub dataset: Arc<ClientDataset>,
    pub selection: RegionSelection,
    pub notices: Vec<Notice>,
    pub outcome: PipelineOutcome,
}

impl PipelineRun {
    pub fn rows(&self) -> Vec<ClientRowView> {
        match &self.outcome {
            PipelineOutcome::Ready(view) => table_rows(&view.clients),
            PipelineOutcome::AwaitingSelection | PipelineOutcome::Empty(_) => Vec::new(),
        }
    }

    pub fn map_view(&self) -> Option<&MapView> {
        match &self.outcome {
            PipelineOutcome::Ready(view) => Some(view),
            PipelineOutcome::AwaitingSelection | PipelineOutcome::Empty(_) => None,
        }
    }

    pub fn export(&self) -> Option<ExportArtifact> {
        self.map_view()
            .map(|view| ExportArtifact::from_document(&view.document))
    }

    pub fn table_view(&self) -> ClientTableView {
        let (status, empty_state) = match &self.outcome {
            PipelineOutcome::AwaitingSelection => (RunStatus::AwaitingSelection, None),
            PipelineOutcome::Empty(state) => (RunStatus::Empty, Some(*state)),
            PipelineOutcome::Ready(_) => (RunStatus::Ready, None),
        };
        let message = match &self.outcome {
            PipelineOutcome::AwaitingSelection => Some(AWAITING_SELECTION_MESSAGE),
            PipelineOutcome::Empty(state) => Some(state.message()),
            PipelineOutcome::Ready(_) => None,
        };

        ClientTableView {
            status,
            empty_state,
            message,
            selected_regions: self.selection.iter().map(str::to_string).collect(),
            available_regions: self.dataset.regions(),
            notices: self.notices.clone(),
            rows: self.rows(),
        }
    }
}

pub const AWAITING_SELECTION_MESSAGE: &str =
    "Select at least one region to display the map.";

/// Loader, filter, geocoder, mapper and renderer chained in that order.
///
/// The pipeline itself holds no mutable state; callers pass the caches to
/// every run and must not run two pipelines over the same caches at once.
#[derive(Debug)]
pub struct ClientMapPipeline<R, G> {
    remote: R,
    geocoder: G,
    settings: PipelineSettings,
}

impl<R, G> ClientMapPipeline<R, G>
where
    R: RemoteSource,
    G: GeocodingProvider,
{
    pub fn new(remote: R, geocoder: G, settings: PipelineSettings) -> Self {
        Self {
            remote,
            geocoder,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn into_parts(self) -> (R, G) {
        (self.remote, self.geocoder)
    }

    pub async fn load_dataset(
        &self,
        caches: &mut PipelineCaches,
    ) -> Result<Arc<ClientDataset>, DataFetchError> {
        load_clients(&self.remote, &self.settings.clients_url, &mut caches.datasets).await
    }

    pub async fn run(
        &self,
        selection: &RegionSelection,
        caches: &mut PipelineCaches,
    ) -> Result<PipelineRun, DataFetchError> {
        let dataset = self.load_dataset(caches).await?;

        let finish = |notices: Vec<Notice>, outcome: PipelineOutcome| PipelineRun {
            dataset: Arc::clone(&dataset),
            selection: selection.clone(),
            notices,
            outcome,
        };

        let filtered = match filter_by_regions(
            &dataset.records,
            selection,
            self.settings.empty_selection,
        ) {
            FilterOutcome::AwaitingSelection => {
                return Ok(finish(Vec::new(), PipelineOutcome::AwaitingSelection));
            }
            FilterOutcome::NoMatches => {
                info!("no client matches the selected regions");
                return Ok(finish(
                    Vec::new(),
                    PipelineOutcome::Empty(EmptyResultState::NoMatchingRecords),
                ));
            }
            FilterOutcome::Matched(records) => records,
        };
        info!(matched = filtered.len(), "clients filtered by region");

        let mut stage = geocode_records(
            &self.geocoder,
            &mut caches.geocodes,
            filtered,
            self.settings.geocode_failures,
        )
        .await;
        info!(
            resolved = stage.resolved.len(),
            unresolved = stage.unresolved,
            missing_address = stage.missing_address,
            lookups = stage.lookups,
            "client addresses geocoded"
        );

        if stage.lookups > 0 {
            stage.notices.insert(
                0,
                Notice::info(format!("Geocoded {} new address(es)", stage.lookups)),
            );
        }

        if stage.resolved.is_empty() {
            return Ok(finish(
                stage.notices,
                PipelineOutcome::Empty(EmptyResultState::NoGeocodedRecords),
            ));
        }

        let boundaries = load_boundaries(&self.remote, &self.settings.boundaries_url).await?;
        let map = match build_map(&stage.resolved, boundaries, &self.settings.map) {
            Ok(map) => map,
            Err(state) => return Ok(finish(stage.notices, PipelineOutcome::Empty(state))),
        };
        let document = render_map_document(&map);

        Ok(finish(
            stage.notices,
            PipelineOutcome::Ready(MapView {
                map,
                document,
                clients: stage.resolved,
            }),
        ))
    }
}
