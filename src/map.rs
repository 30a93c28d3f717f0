//! Map assembly and HTML rendering.
//!
//! A [`MapDocument`] holds everything the Leaflet page needs: view, base
//! layer, the earthquake overlay, layer control and depth legend. It is
//! built once per session and rendered into a self-contained page that
//! loads Leaflet from a CDN.

use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use crate::depth::legend_bands;
use crate::errors::QuakeMapError;
use crate::filters::MarkerFilter;
use crate::models::FeatureCollection;
use crate::projector::{MarkerDescriptor, project};

const LEAFLET_VERSION: &str = "1.9.4";
const OSM_TILES: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const OSM_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

/// What to do with markers whose depth falls below every band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnclassifiedPolicy {
    /// Draw the marker without a color; Leaflet falls back to its defaults
    #[default]
    Keep,
    /// Leave the marker off the overlay
    Skip,
    /// Abort the run
    Error,
}

impl FromStr for UnclassifiedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "skip" => Ok(Self::Skip),
            "error" => Ok(Self::Error),
            _ => Err(format!("unknown policy: {s} (expected: keep, skip, error)")),
        }
    }
}

/// Initial map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    /// `[latitude, longitude]`
    pub center: [f64; 2],
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: [5.06, 130.88],
            zoom: 5,
        }
    }
}

/// Parse `lat,lon` for `--center`.
///
/// # Errors
///
/// Returns a message if the value is not two in-range numbers.
pub fn parse_center(s: &str) -> Result<[f64; 2], String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("center requires lat,lon, got {s}"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("invalid latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("invalid longitude: {e}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("center {lat},{lon} out of range"));
    }
    Ok([lat, lon])
}

#[derive(Debug, Clone, Serialize)]
pub struct TileLayer {
    pub name: &'static str,
    pub url: &'static str,
    pub attribution: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerControl {
    pub overlay_name: &'static str,
    pub collapsed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: &'static str,
}

/// Depth legend, always listing every band.
#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub title: &'static str,
    pub position: &'static str,
    pub entries: Vec<LegendEntry>,
}

impl Default for Legend {
    fn default() -> Self {
        Self {
            title: "Earthquake Depth",
            position: "bottomright",
            entries: legend_bands()
                .map(|band| LegendEntry {
                    label: band.label,
                    color: band.color,
                })
                .collect(),
        }
    }
}

/// Counts from one projection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverlaySummary {
    pub total: usize,
    pub invalid: usize,
    pub filtered: usize,
    pub unclassified: usize,
    pub rendered: usize,
}

/// Convert, filter and project every feature of a collection.
///
/// Records missing a required field are logged and counted, not fatal.
///
/// # Errors
///
/// Returns [`QuakeMapError::DepthUnclassified`] for the first shallow event
/// when the policy is [`UnclassifiedPolicy::Error`].
pub fn build_overlay(
    collection: &FeatureCollection,
    filter: &MarkerFilter,
    policy: UnclassifiedPolicy,
) -> Result<(Vec<MarkerDescriptor>, OverlaySummary), QuakeMapError> {
    let mut summary = OverlaySummary {
        total: collection.features.len(),
        ..OverlaySummary::default()
    };
    let mut markers = Vec::with_capacity(collection.features.len());

    for result in collection.earthquakes() {
        let quake = match result {
            Ok(quake) => quake,
            Err(e) => {
                warn!("skipping feature: {e}");
                summary.invalid += 1;
                continue;
            }
        };

        if !filter.matches(&quake) {
            summary.filtered += 1;
            continue;
        }

        let marker = project(&quake);
        if !marker.band.is_classified() {
            summary.unclassified += 1;
            match policy {
                UnclassifiedPolicy::Keep => {}
                UnclassifiedPolicy::Skip => continue,
                UnclassifiedPolicy::Error => {
                    marker.band.require_color(&marker.id, marker.depth_km)?;
                }
            }
        }
        markers.push(marker);
    }

    summary.rendered = markers.len();
    debug!(?summary, "overlay built");
    if summary.unclassified > 0 {
        warn!(
            "{} event(s) shallower than 10 km have no depth color (policy: {policy:?})",
            summary.unclassified
        );
    }

    Ok((markers, summary))
}

/// Everything the map page renders.
#[derive(Debug, Clone, Serialize)]
pub struct MapDocument {
    pub title: String,
    pub view: MapView,
    pub base_layer: TileLayer,
    pub layer_control: LayerControl,
    pub legend: Legend,
    pub markers: Vec<MarkerDescriptor>,
}

impl MapDocument {
    #[must_use]
    pub fn new(title: impl Into<String>, view: MapView, markers: Vec<MarkerDescriptor>) -> Self {
        Self {
            title: title.into(),
            view,
            base_layer: TileLayer {
                name: "Street Map",
                url: OSM_TILES,
                attribution: OSM_ATTRIBUTION,
            },
            layer_control: LayerControl {
                overlay_name: "Earthquakes",
                collapsed: false,
            },
            legend: Legend::default(),
            markers,
        }
    }

    /// Render the standalone HTML page.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized.
    pub fn render_html(&self) -> Result<String, QuakeMapError> {
        let title = escape_html(&self.title);
        let data = self.to_embedded_json()?;
        Ok(fill_template(
            PAGE_TEMPLATE,
            &[
                ("LEAFLET_VERSION", LEAFLET_VERSION),
                ("TITLE", &title),
                ("MAP_DATA", &data),
            ],
        ))
    }

    /// JSON safe to place inside a `<script>` element.
    fn to_embedded_json(&self) -> Result<String, QuakeMapError> {
        Ok(serde_json::to_string(self)?.replace('<', "\\u003c"))
    }
}

/// Substitute `{{KEY}}` placeholders in one pass over the template, so
/// substituted text is never scanned for placeholders itself.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let hit = after.find("}}").and_then(|end| {
            values
                .iter()
                .find(|(key, _)| *key == &after[..end])
                .map(|(_, value)| (end, *value))
        });
        match hit {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{TITLE}}</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@{{LEAFLET_VERSION}}/dist/leaflet.css">
  <style>
    html, body, #map { height: 100%; margin: 0; }
    .legend { background: white; border: 1px solid #ccc; padding: 6px 10px; }
    .legend h3 { margin: 0 0 6px; }
    .legend-row { display: flex; align-items: center; }
    .legend-swatch { width: 20px; height: 20px; margin-right: 5px; }
  </style>
</head>
<body>
  <div id="map"></div>
  <script type="application/json" id="map-data">{{MAP_DATA}}</script>
  <script src="https://unpkg.com/leaflet@{{LEAFLET_VERSION}}/dist/leaflet.js"></script>
  <script>
    const doc = JSON.parse(document.getElementById("map-data").textContent);

    const street = L.tileLayer(doc.base_layer.url, { attribution: doc.base_layer.attribution });

    const earthquakes = L.layerGroup(doc.markers.map((m) => {
      const options = { fillOpacity: m.fill_opacity, radius: m.radius };
      if (m.color !== null) {
        options.color = m.color;
        options.fillColor = m.fill_color;
      }
      return L.circle(m.position, options).bindPopup(m.popup_text);
    }));

    const map = L.map("map", {
      center: doc.view.center,
      zoom: doc.view.zoom,
      layers: [street, earthquakes]
    });

    L.control.layers(
      { [doc.base_layer.name]: street },
      { [doc.layer_control.overlay_name]: earthquakes },
      { collapsed: doc.layer_control.collapsed }
    ).addTo(map);

    const legend = L.control({ position: doc.legend.position });
    legend.onAdd = function () {
      const div = L.DomUtil.create("div", "legend");
      const title = document.createElement("h3");
      title.textContent = doc.legend.title;
      div.appendChild(title);
      for (const entry of doc.legend.entries) {
        const row = document.createElement("div");
        row.className = "legend-row";
        const swatch = document.createElement("div");
        swatch.className = "legend-swatch";
        swatch.style.backgroundColor = entry.color;
        const label = document.createElement("span");
        label.textContent = entry.label;
        row.append(swatch, label);
        div.appendChild(row);
      }
      return div;
    };
    legend.addTo(map);
  </script>
</body>
</html>
"#;
