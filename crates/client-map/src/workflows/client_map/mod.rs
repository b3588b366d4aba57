//! Client map workflow: load the client list, keep the selected regions, geocode
//! addresses and render a Leaflet map with a table and a downloadable copy.

pub mod domain;
pub mod filter;
pub mod geocoding;
pub mod loader;
pub mod mapping;
mod markup;
mod pipeline;
mod remote;
pub mod report;

pub use domain::{
    ApiKey, ClientRecord, Coordinate, EmptyResultState, EmptySelectionPolicy,
    GeocodeFailurePolicy, Notice, NoticeLevel, RegionSelection, ResolvedClient,
};
pub use filter::{filter_by_regions, FilterOutcome};
pub use geocoding::{
    geocode_records, resolve_address, GeocodeCache, GeocodeLookupFailure, GeocodeResolution,
    GeocodeStage, GeocodingProvider, OpenCageProvider,
};
pub use loader::{load_clients, ClientDataset, DatasetCache, RegionCount};
pub use mapping::{build_map, centroid, BoundarySet, ClientMap, MapMarker, MapSettings};
pub use markup::escape_html;
pub use pipeline::{
    ClientMapPipeline, MapView, PipelineCaches, PipelineOutcome, PipelineRun, PipelineSettings,
    AWAITING_SELECTION_MESSAGE,
};
pub use remote::{DataFetchError, HttpRemoteSource, RemoteSource};
pub use report::{
    embedded_markers, render_map_document, render_page, ClientRowView, ClientTableView,
    ExportArtifact, MapDocument, PageState, RunStatus, EXPORT_FILE_NAME,
};
