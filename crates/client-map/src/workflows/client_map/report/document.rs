use super::super::mapping::ClientMap;
use super::super::markup::{escape_html, script_json};
use serde_json::json;
use std::fmt::Write;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

/// Standalone HTML rendering of a [`ClientMap`]. The same bytes are embedded in the
/// operator page and served as the export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDocument(String);

impl MapDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
impl MapDocument {
    pub(crate) fn from_test_markup(markup: &str) -> Self {
        Self(markup.to_string())
    }
}

/// Renders `map` deterministically: equal maps give byte-identical documents.
pub fn render_map_document(map: &ClientMap) -> MapDocument {
    let center = json!([map.center.latitude, map.center.longitude]);
    let tiles = json!({
        "url": map.tile_url,
        "attribution": map.tile_attribution,
        "maxZoom": 19,
    });
    let boundary_style = json!(map.boundaries.style);
    let markers = map
        .markers
        .iter()
        .map(|marker| {
            json!({
                "lat": marker.coordinate.latitude,
                "lng": marker.coordinate.longitude,
                "popup": marker.label,
            })
        })
        .collect::<Vec<_>>();
    let layer_name = json!(map.boundaries.name);

    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n");
    html.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n",
    );
    writeln!(html, "<title>{}</title>", escape_html(&map.title)).expect("document title");
    writeln!(html, "<link rel=\"stylesheet\" href=\"{LEAFLET_CSS}\" />").expect("leaflet stylesheet");
    writeln!(html, "<script src=\"{LEAFLET_JS}\"></script>").expect("leaflet script");
    html.push_str("<style>\n");
    html.push_str("html, body { height: 100%; margin: 0; }\n");
    html.push_str("#map { position: absolute; top: 0; bottom: 0; left: 0; right: 0; }\n");
    writeln!(
        html,
        ".client-pin {{ width: 14px; height: 14px; border-radius: 50% 50% 50% 0; \
         background: {}; border: 2px solid #ffffff; transform: rotate(-45deg); }}",
        escape_html(&map.marker_color)
    )
    .expect("pin style");
    html.push_str("</style>\n</head>\n<body>\n<div id=\"map\"></div>\n<script>\n");

    writeln!(
        html,
        "const map = L.map(\"map\").setView({}, {});",
        script_json(&center),
        map.zoom
    )
    .expect("map view");
    writeln!(html, "const tiles = {};", script_json(&tiles)).expect("tile options");
    html.push_str(
        "L.tileLayer(tiles.url, { maxZoom: tiles.maxZoom, attribution: tiles.attribution }).addTo(map);\n",
    );
    writeln!(html, "const boundaryStyle = {};", script_json(&boundary_style)).expect("boundary style");
    writeln!(
        html,
        "const boundaryData = {};",
        script_json(map.boundaries.data.as_json())
    )
    .expect("boundary data");
    html.push_str(
        "const boundaries = L.geoJSON(boundaryData, { style: () => boundaryStyle }).addTo(map);\n",
    );
    writeln!(
        html,
        "L.control.layers(null, {{ [{}]: boundaries }}).addTo(map);",
        script_json(&layer_name)
    )
    .expect("layer control");
    writeln!(html, "const markers = {};", script_json(&json!(markers))).expect("marker data");
    html.push_str(
        "const pin = L.divIcon({ className: \"\", html: '<div class=\"client-pin\"></div>', iconSize: [18, 18], iconAnchor: [9, 18], popupAnchor: [0, -18] });\n",
    );
    html.push_str("for (const marker of markers) {\n");
    html.push_str(
        "  L.marker([marker.lat, marker.lng], { icon: pin }).bindPopup(marker.popup).addTo(map);\n",
    );
    html.push_str("}\n</script>\n</body>\n</html>\n");

    MapDocument(html)
}

/// Marker positions and popups as embedded in a rendered document.
///
/// Reads back the `const markers = [...]` line; returns `None` when the document
/// was not produced by [`render_map_document`].
pub fn embedded_markers(document: &str) -> Option<Vec<(f64, f64, String)>> {
    let line = document
        .lines()
        .find_map(|line| line.strip_prefix("const markers = "))?;
    let raw = line.strip_suffix(';')?;
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;

    value
        .as_array()?
        .iter()
        .map(|marker| {
            Some((
                marker.get("lat")?.as_f64()?,
                marker.get("lng")?.as_f64()?,
                marker.get("popup")?.as_str()?.to_string(),
            ))
        })
        .collect()
}
