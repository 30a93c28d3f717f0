//! Feature selection applied before projection.

use std::str::FromStr;

use crate::depth::{DepthClass, band_by_label, classify};
use crate::models::EarthquakeFeature;

/// Bounding box for geographic filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

fn check_range(name: &str, value: f64, limit: f64) -> Result<(), String> {
    if (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(format!("{name} {value} out of range [-{limit}, {limit}]"))
    }
}

impl FromStr for BBox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let vals = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid number in bbox: {e}"))?;

        let &[min_lat, min_lon, max_lat, max_lon] = vals.as_slice() else {
            return Err(format!(
                "bbox requires 4 values (minlat,minlon,maxlat,maxlon), got {}",
                vals.len()
            ));
        };

        check_range("min_lat", min_lat, 90.0)?;
        check_range("max_lat", max_lat, 90.0)?;
        check_range("min_lon", min_lon, 180.0)?;
        check_range("max_lon", max_lon, 180.0)?;
        if min_lat > max_lat {
            return Err(format!("min_lat {min_lat} must be <= max_lat {max_lat}"));
        }

        Ok(Self { min_lat, min_lon, max_lat, max_lon })
    }
}

impl BBox {
    /// Check if a point is within the box. A box with `min_lon > max_lon`
    /// wraps across the antimeridian.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let lat_ok = lat >= self.min_lat && lat <= self.max_lat;
        let lon_ok = if self.min_lon <= self.max_lon {
            lon >= self.min_lon && lon <= self.max_lon
        } else {
            lon >= self.min_lon || lon <= self.max_lon
        };
        lat_ok && lon_ok
    }
}

/// Parse a `--band` value.
///
/// # Errors
///
/// Returns a message listing valid labels when the label is unknown.
pub fn parse_band(s: &str) -> Result<DepthClass, String> {
    band_by_label(s).ok_or_else(|| {
        format!("unknown depth band: {s} (expected 10-30, 30-50, 50-70, 70-90, 90+ or unclassified)")
    })
}

/// Combined filter criteria. Empty criteria match everything.
#[derive(Debug, Default, Clone)]
pub struct MarkerFilter {
    pub min_magnitude: Option<f64>,
    pub bbox: Option<BBox>,
    pub bands: Vec<DepthClass>,
}

impl MarkerFilter {
    /// Check if an earthquake passes every criterion.
    #[must_use]
    pub fn matches(&self, quake: &EarthquakeFeature) -> bool {
        self.min_magnitude.is_none_or(|min| quake.magnitude >= min)
            && self
                .bbox
                .is_none_or(|bbox| bbox.contains(quake.latitude, quake.longitude))
            && (self.bands.is_empty() || self.bands.contains(&classify(quake.depth_km)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quake(magnitude: f64, depth_km: f64, latitude: f64, longitude: f64) -> EarthquakeFeature {
        EarthquakeFeature {
            id: "t".into(),
            place: None,
            time: None,
            magnitude,
            depth_km,
            longitude,
            latitude,
        }
    }

    #[test]
    fn test_bbox_parse() {
        let bbox: BBox = "-10,120,10,140".parse().unwrap();
        assert!((bbox.min_lat - -10.0).abs() < 0.001);
        assert!((bbox.max_lon - 140.0).abs() < 0.001);

        assert!("1,2,3".parse::<BBox>().is_err());
        assert!("95,0,96,1".parse::<BBox>().is_err());
        assert!("10,0,-10,1".parse::<BBox>().is_err());
        assert!("a,b,c,d".parse::<BBox>().is_err());
    }

    #[test]
    fn test_bbox_contains() {
        let bbox: BBox = "-10,120,10,140".parse().unwrap();
        assert!(bbox.contains(5.06, 130.88));
        assert!(!bbox.contains(20.0, 130.0));
    }

    #[test]
    fn test_bbox_antimeridian() {
        let bbox: BBox = "-30,170,-10,-170".parse().unwrap();
        assert!(bbox.contains(-23.4, -178.9));
        assert!(bbox.contains(-20.0, 175.0));
        assert!(!bbox.contains(-20.0, 0.0));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(MarkerFilter::default().matches(&quake(-1.0, -5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_min_magnitude() {
        let filter = MarkerFilter {
            min_magnitude: Some(5.0),
            ..Default::default()
        };
        assert!(filter.matches(&quake(5.0, 20.0, 0.0, 0.0)));
        assert!(!filter.matches(&quake(4.9, 20.0, 0.0, 0.0)));
    }

    #[test]
    fn test_bands() {
        let filter = MarkerFilter {
            bands: vec![parse_band("90+").unwrap(), parse_band("unclassified").unwrap()],
            ..Default::default()
        };
        assert!(filter.matches(&quake(5.0, 120.0, 0.0, 0.0)));
        assert!(filter.matches(&quake(5.0, 3.0, 0.0, 0.0)));
        assert!(!filter.matches(&quake(5.0, 45.0, 0.0, 0.0)));
        assert!(parse_band("0-10").is_err());
    }
}
