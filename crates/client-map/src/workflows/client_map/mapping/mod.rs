mod boundary;

use super::domain::{Coordinate, EmptyResultState, ResolvedClient};
use super::markup::escape_html;
use serde::Serialize;
use tracing::info;

pub use boundary::{load_boundaries, BoundarySet};

pub const BOUNDARY_LAYER_NAME: &str = "Regions";

/// Leaflet path options applied to every boundary polygon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryStyle {
    pub fill_color: String,
    pub color: String,
    pub weight: f64,
    pub fill_opacity: f64,
}

impl Default for BoundaryStyle {
    fn default() -> Self {
        Self {
            fill_color: "orange".to_string(),
            color: "black".to_string(),
            weight: 0.5,
            fill_opacity: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub title: String,
    pub zoom: u8,
    pub tile_url: String,
    pub tile_attribution: String,
    pub boundary_style: BoundaryStyle,
    pub marker_color: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            title: "Client map".to_string(),
            zoom: 6,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            tile_attribution: "&copy; OpenStreetMap contributors".to_string(),
            boundary_style: BoundaryStyle::default(),
            marker_color: "darkgreen".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLayer {
    pub name: &'static str,
    pub style: BoundaryStyle,
    pub data: BoundarySet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub row: usize,
    pub coordinate: Coordinate,
    /// Popup markup, values already escaped.
    pub label: String,
}

/// Everything needed to draw the client map.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientMap {
    pub title: String,
    pub center: Coordinate,
    pub zoom: u8,
    pub tile_url: String,
    pub tile_attribution: String,
    pub marker_color: String,
    pub boundaries: BoundaryLayer,
    pub markers: Vec<MapMarker>,
}

/// Arithmetic mean of `points`; `None` when there are no points.
pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
    if points.is_empty() {
        return None;
    }

    let count = points.len() as f64;
    let (lat_sum, lng_sum) = points.iter().fold((0.0, 0.0), |(lat, lng), point| {
        (lat + point.latitude, lng + point.longitude)
    });

    Some(Coordinate {
        latitude: lat_sum / count,
        longitude: lng_sum / count,
    })
}

pub fn marker_label(client: &ResolvedClient) -> String {
    format!(
        "<b>Name:</b> {}<br><b>Address:</b> {}<br><b>Region:</b> {}<br>",
        escape_html(&client.name),
        escape_html(client.address.as_deref().unwrap_or("")),
        escape_html(client.region.as_deref().unwrap_or("")),
    )
}

/// Builds the map for `clients`. An empty slice yields
/// [`EmptyResultState::NoGeocodedRecords`] without computing a centre.
pub fn build_map(
    clients: &[ResolvedClient],
    boundaries: BoundarySet,
    settings: &MapSettings,
) -> Result<ClientMap, EmptyResultState> {
    if clients.is_empty() {
        return Err(EmptyResultState::NoGeocodedRecords);
    }

    let points: Vec<Coordinate> = clients.iter().map(|client| client.coordinate).collect();
    let center = centroid(&points).ok_or(EmptyResultState::NoGeocodedRecords)?;

    let markers = clients
        .iter()
        .map(|client| MapMarker {
            row: client.row,
            coordinate: client.coordinate,
            label: marker_label(client),
        })
        .collect::<Vec<_>>();

    info!(
        markers = markers.len(),
        latitude = center.latitude,
        longitude = center.longitude,
        "client map built"
    );

    Ok(ClientMap {
        title: settings.title.clone(),
        center,
        zoom: settings.zoom,
        tile_url: settings.tile_url.clone(),
        tile_attribution: settings.tile_attribution.clone(),
        marker_color: settings.marker_color.clone(),
        boundaries: BoundaryLayer {
            name: BOUNDARY_LAYER_NAME,
            style: settings.boundary_style.clone(),
            data: boundaries,
        },
        markers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(row: usize, name: &str, lat: f64, lng: f64) -> ResolvedClient {
        ResolvedClient {
            row,
            name: name.to_string(),
            address: Some(format!("{row} Rue X")),
            region: Some("Paris".to_string()),
            coordinate: Coordinate::new(lat, lng).expect("valid coordinate"),
        }
    }

    #[test]
    fn centroid_is_the_mean_of_points() {
        let points = [
            Coordinate::new(48.0, 2.0).expect("valid"),
            Coordinate::new(50.0, 4.0).expect("valid"),
        ];
        let center = centroid(&points).expect("centre");
        assert!((center.latitude - 49.0).abs() < 1e-9);
        assert!((center.longitude - 3.0).abs() < 1e-9);
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn empty_input_is_an_empty_state() {
        assert_eq!(
            build_map(&[], BoundarySet::empty(), &MapSettings::default()),
            Err(EmptyResultState::NoGeocodedRecords)
        );
    }

    #[test]
    fn one_marker_per_client_with_escaped_label() {
        let clients = vec![
            client(0, "Dupont & Fils", 48.85, 2.35),
            client(3, "<script>", 50.63, 3.06),
        ];
        let map = build_map(&clients, BoundarySet::empty(), &MapSettings::default())
            .expect("map builds");

        assert_eq!(map.markers.len(), 2);
        assert_eq!(map.markers[1].row, 3);
        assert_eq!(map.zoom, 6);
        assert_eq!(map.boundaries.name, "Regions");
        assert_eq!(map.boundaries.style.fill_color, "orange");
        assert!(map.markers[0]
            .label
            .starts_with("<b>Name:</b> Dupont &amp; Fils<br><b>Address:</b> 0 Rue X"));
        assert!(!map.markers[1].label.contains("<script>"));
    }

    #[test]
    fn boundary_style_serializes_as_leaflet_options() {
        let value = serde_json::to_value(BoundaryStyle::default()).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "fillColor": "orange",
                "color": "black",
                "weight": 0.5,
                "fillOpacity": 0.2
            })
        );
    }
}
