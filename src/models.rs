//! Data models for USGS earthquake feeds.
//!
//! [`FeatureCollection`] mirrors the GeoJSON the summary feeds return;
//! [`EarthquakeFeature`] is the trimmed record the projector works from.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::QuakeMapError;

/// Top-level GeoJSON response from USGS feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    /// Always "FeatureCollection"
    #[serde(rename = "type")]
    pub type_: String,

    /// Feed metadata (absent in hand-built files)
    #[serde(default)]
    pub metadata: Option<Metadata>,

    /// Earthquake events. A record that cannot be read becomes an empty
    /// [`Feature`] and fails later in [`Feature::to_earthquake`].
    #[serde(default, deserialize_with = "lenient_features")]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Validate the response structure.
    ///
    /// # Errors
    ///
    /// Returns [`QuakeMapError::InvalidResponse`] if the top-level type is wrong.
    pub fn validate(&self) -> Result<(), QuakeMapError> {
        if self.type_ != "FeatureCollection" {
            return Err(QuakeMapError::InvalidResponse(format!(
                "expected type 'FeatureCollection', got '{}'",
                self.type_
            )));
        }
        Ok(())
    }

    /// Convert every feature, one result per record.
    pub fn earthquakes(&self) -> impl Iterator<Item = Result<EarthquakeFeature, QuakeMapError>> + '_ {
        self.features.iter().map(Feature::to_earthquake)
    }
}

/// Metadata about the feed response.
#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    /// When this feed was generated (ms since epoch)
    pub generated: Option<i64>,

    /// Human-readable title
    pub title: Option<String>,

    /// Number of events in response
    pub count: Option<usize>,
}

/// Decode a value, treating a wrong type like an absent one.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Coordinates with each non-numeric entry read as absent.
fn lenient_coordinates<'de, D>(deserializer: D) -> Result<Vec<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let coordinates = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().map(Value::as_f64).collect(),
        _ => Vec::new(),
    };
    Ok(coordinates)
}

fn lenient_features<'de, D>(deserializer: D) -> Result<Vec<Feature>, D::Error>
where
    D: Deserializer<'de>,
{
    let records = Vec::<Value>::deserialize(deserializer)?;
    Ok(records
        .into_iter()
        .map(|record| serde_json::from_value(record).unwrap_or_default())
        .collect())
}

/// A single earthquake record as it appears in the feed.
///
/// Every field decodes leniently so one bad record cannot sink the feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feature {
    /// Unique event ID
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient")]
    pub geometry: Option<Geometry>,

    #[serde(default, deserialize_with = "lenient")]
    pub properties: Properties,
}

/// Point geometry: `[longitude, latitude, depth_km]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Geometry {
    #[serde(default, deserialize_with = "lenient_coordinates")]
    pub coordinates: Vec<Option<f64>>,
}

/// The subset of USGS event properties the map uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Properties {
    #[serde(default, deserialize_with = "lenient")]
    pub mag: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub place: Option<String>,
    /// Event time (ms since epoch)
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<i64>,
}

impl Feature {
    fn coordinate(&self, index: usize) -> Option<f64> {
        self.geometry
            .as_ref()
            .and_then(|g| g.coordinates.get(index).copied().flatten())
    }

    fn missing(&self, field: &'static str) -> QuakeMapError {
        QuakeMapError::MissingField {
            id: self.id.clone(),
            field,
        }
    }

    /// Convert into the record the projector consumes.
    ///
    /// # Errors
    ///
    /// Returns [`QuakeMapError::MissingField`] when magnitude or any of the
    /// three coordinates is absent.
    pub fn to_earthquake(&self) -> Result<EarthquakeFeature, QuakeMapError> {
        let magnitude = self.properties.mag.ok_or_else(|| self.missing("properties.mag"))?;
        let longitude = self.coordinate(0).ok_or_else(|| self.missing("longitude"))?;
        let latitude = self.coordinate(1).ok_or_else(|| self.missing("latitude"))?;
        let depth_km = self.coordinate(2).ok_or_else(|| self.missing("depth"))?;

        Ok(EarthquakeFeature {
            id: self.id.clone(),
            place: self.properties.place.clone(),
            time: self
                .properties
                .time
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            magnitude,
            depth_km,
            longitude,
            latitude,
        })
    }
}

/// One earthquake, ready to be projected onto the map.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeFeature {
    pub id: String,
    pub place: Option<String>,
    pub time: Option<DateTime<Utc>>,
    pub magnitude: f64,
    pub depth_km: f64,
    pub longitude: f64,
    pub latitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_feed() {
        let json = include_str!("../tools/sample_4.5_month.json");
        let feed: FeatureCollection =
            serde_json::from_str(json).expect("failed to parse sample feed");

        feed.validate().expect("invalid feed");
        assert_eq!(feed.features.len(), 5);
        assert_eq!(feed.metadata.as_ref().and_then(|m| m.count), Some(5));

        let results: Vec<_> = feed.earthquakes().collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);

        let first = results[0].as_ref().expect("first feature valid");
        assert_eq!(first.id, "us7000n1a1");
        assert!((first.depth_km - 95.2).abs() < 1e-9);
        assert!((first.latitude - -6.123).abs() < 1e-9);
        assert!(first.time.is_some());
    }

    #[test]
    fn test_missing_magnitude() {
        let json = r#"{"type":"Feature","id":"ak1","properties":{"mag":null,"place":"x","time":0},
                       "geometry":{"type":"Point","coordinates":[1.0,2.0,3.0]}}"#;
        let feature: Feature = serde_json::from_str(json).unwrap();
        let err = feature.to_earthquake().unwrap_err();
        assert!(matches!(err, QuakeMapError::MissingField { field: "properties.mag", .. }));
    }

    #[test]
    fn test_missing_depth() {
        let json = r#"{"type":"Feature","id":"ak2","properties":{"mag":4.6},
                       "geometry":{"type":"Point","coordinates":[1.0,2.0]}}"#;
        let feature: Feature = serde_json::from_str(json).unwrap();
        let err = feature.to_earthquake().unwrap_err();
        assert!(matches!(err, QuakeMapError::MissingField { field: "depth", .. }));
    }

    #[test]
    fn test_optional_place_and_time() {
        let json = r#"{"type":"Feature","id":"ak3","properties":{"mag":4.6},
                       "geometry":{"type":"Point","coordinates":[1.0,2.0,12.5]}}"#;
        let feature: Feature = serde_json::from_str(json).unwrap();
        let quake = feature.to_earthquake().unwrap();
        assert_eq!(quake.place, None);
        assert_eq!(quake.time, None);
    }

    #[test]
    fn test_malformed_records_stay_per_feature() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","id":"ok1","properties":{"mag":4.7,"place":"Tonga","time":0},
             "geometry":{"type":"Point","coordinates":[-175.2,-21.1,33.0]}},
            {"type":"Feature","id":"bad1","properties":null,
             "geometry":{"type":"Point","coordinates":[1.0,2.0,3.0]}},
            {"type":"Feature","id":"bad2","properties":{"mag":"4.6","place":"Fiji"},
             "geometry":{"type":"Point","coordinates":[1.0,2.0,3.0]}},
            {"type":"Feature","id":"bad3","properties":{"mag":5.1},
             "geometry":{"type":"Point","coordinates":[1.0,"2.0",3.0]}},
            42
        ]}"#;
        let feed: FeatureCollection = serde_json::from_str(json).unwrap();
        assert_eq!(feed.features.len(), 5);

        let results: Vec<_> = feed.earthquakes().collect();
        assert_eq!(results[0].as_ref().unwrap().id, "ok1");
        assert!(matches!(
            &results[1],
            Err(QuakeMapError::MissingField { id, field: "properties.mag" }) if id == "bad1"
        ));
        assert!(matches!(
            &results[2],
            Err(QuakeMapError::MissingField { id, field: "properties.mag" }) if id == "bad2"
        ));
        assert!(matches!(
            &results[3],
            Err(QuakeMapError::MissingField { field: "latitude", .. })
        ));
        assert!(matches!(&results[4], Err(QuakeMapError::MissingField { .. })));
    }

    #[test]
    fn test_features_not_an_array() {
        let result: Result<FeatureCollection, _> =
            serde_json::from_str(r#"{"type":"FeatureCollection","features":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_collection_type() {
        let feed: FeatureCollection =
            serde_json::from_str(r#"{"type":"Feature","features":[]}"#).unwrap();
        assert!(matches!(feed.validate(), Err(QuakeMapError::InvalidResponse(_))));
    }
}
