//! Feature projection.
//!
//! Turns an [`EarthquakeFeature`] into the circle marker drawn on the map.

use serde::Serialize;

use crate::depth::{DepthClass, classify};
use crate::models::EarthquakeFeature;

/// Meters of circle radius per unit of magnitude.
pub const RADIUS_SCALE: f64 = 5000.0;

/// Fill opacity for every marker.
pub const FILL_OPACITY: f64 = 0.75;

/// Popup rendering of a missing place, as the browser prints it.
const ABSENT: &str = "undefined";

/// Popup rendering of a missing timestamp.
const INVALID_DATE: &str = "Invalid Date";

/// Renderable circle marker derived from one earthquake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerDescriptor {
    pub id: String,
    /// `[latitude, longitude]`
    pub position: [f64; 2],
    /// Circle radius in meters
    pub radius: f64,
    /// Depth band; serialized as its label
    pub band: DepthClass,
    /// Stroke color (`None` when unclassified)
    pub color: Option<&'static str>,
    /// Fill color, always equal to `color`
    pub fill_color: Option<&'static str>,
    pub fill_opacity: f64,
    pub popup_text: String,
    pub magnitude: f64,
    pub depth_km: f64,
}

impl MarkerDescriptor {
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.position[0]
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.position[1]
    }
}

/// Project a feature onto a marker. Radius is not clamped: zero or negative
/// magnitudes pass straight through.
#[must_use]
pub fn project(feature: &EarthquakeFeature) -> MarkerDescriptor {
    let band = classify(feature.depth_km);
    let color = band.color();

    MarkerDescriptor {
        id: feature.id.clone(),
        position: [feature.latitude, feature.longitude],
        radius: feature.magnitude * RADIUS_SCALE,
        band,
        color,
        fill_color: color,
        fill_opacity: FILL_OPACITY,
        popup_text: popup_text(feature),
        magnitude: feature.magnitude,
        depth_km: feature.depth_km,
    }
}

/// Popup HTML. Place text is inserted as-is.
#[must_use]
pub fn popup_text(feature: &EarthquakeFeature) -> String {
    let place = feature.place.as_deref().unwrap_or(ABSENT);
    let time = feature.time.map_or_else(
        || INVALID_DATE.to_string(),
        |t| t.format("%a %b %d %Y %H:%M:%S UTC").to_string(),
    );

    format!(
        "<h3>{place}</h3><hr><p>{time}</p><hr><p>magnitude: {}</p><hr><p>depth:{}</p>",
        browser_number(feature.magnitude),
        browser_number(feature.depth_km)
    )
}

/// Number text as a browser prints it: `-0` reads `0`, infinities spelled out.
fn browser_number(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // -0.0 + 0.0 is +0.0
    (value + 0.0).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn quake(magnitude: f64, depth_km: f64) -> EarthquakeFeature {
        EarthquakeFeature {
            id: "us7000test".into(),
            place: Some("10 km N of Somewhere".into()),
            time: Utc.timestamp_millis_opt(1_717_189_200_000).single(),
            magnitude,
            depth_km,
            longitude: 128.5,
            latitude: -6.1,
        }
    }

    #[test]
    fn test_deep_strong_event() {
        let marker = project(&quake(6.0, 95.0));
        assert_eq!(marker.color, Some("#330000"));
        assert!((marker.radius - 30_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_intermediate_event() {
        let marker = project(&quake(4.5, 45.0));
        assert_eq!(marker.color, Some("#ff6666"));
        assert_eq!(marker.band.label(), "30-50");
        assert!((marker.radius - 22_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_shallow_event_unclassified() {
        let marker = project(&quake(5.0, 5.0));
        assert_eq!(marker.band, DepthClass::Unclassified);
        assert_eq!(marker.color, None);
        assert_eq!(marker.fill_color, None);
        assert!((marker.radius - 25_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_fill_matches_stroke() {
        let marker = project(&quake(4.8, 72.0));
        assert_eq!(marker.color, marker.fill_color);
        assert!((marker.fill_opacity - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_position_is_lat_lon() {
        let marker = project(&quake(4.8, 72.0));
        assert!((marker.latitude() - -6.1).abs() < 1e-9);
        assert!((marker.longitude() - 128.5).abs() < 1e-9);
    }

    #[test]
    fn test_negative_magnitude_passes_through() {
        let marker = project(&quake(-0.4, 20.0));
        assert!((marker.radius - -2_000.0).abs() < 1e-9);
        assert!(project(&quake(0.0, 20.0)).radius.abs() < f64::EPSILON);
    }

    #[test]
    fn test_projection_is_deterministic() {
        let feature = quake(5.3, 33.3);
        assert_eq!(project(&feature), project(&feature));
    }

    #[test]
    fn test_popup_text() {
        let text = popup_text(&quake(6.0, 95.2));
        assert_eq!(
            text,
            "<h3>10 km N of Somewhere</h3><hr><p>Fri May 31 2024 21:00:00 UTC</p>\
             <hr><p>magnitude: 6</p><hr><p>depth:95.2</p>"
        );
    }

    #[test]
    fn test_popup_absent_fields() {
        let mut feature = quake(4.5, 10.0);
        feature.place = None;
        feature.time = None;
        let text = popup_text(&feature);
        assert!(text.starts_with("<h3>undefined</h3><hr><p>Invalid Date</p>"));
        assert!(text.ends_with("depth:10</p>"));
    }

    #[test]
    fn test_popup_negative_zero() {
        let text = popup_text(&quake(-0.0, -0.0));
        assert!(text.ends_with("<p>magnitude: 0</p><hr><p>depth:0</p>"));
    }

    #[test]
    fn test_browser_number() {
        assert_eq!(browser_number(4.5), "4.5");
        assert_eq!(browser_number(-3.25), "-3.25");
        assert_eq!(browser_number(f64::INFINITY), "Infinity");
        assert_eq!(browser_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_popup_place_not_escaped() {
        let mut feature = quake(4.5, 10.0);
        feature.place = Some("<b>Coast</b>".into());
        assert!(popup_text(&feature).starts_with("<h3><b>Coast</b></h3>"));
    }
}
