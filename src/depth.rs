//! Depth classification.
//!
//! Maps hypocenter depth (km) onto a fixed palette of depth bands. The band
//! boundaries live in [`DEPTH_BANDS`], scanned from the deepest band down.

use serde::{Serialize, Serializer};

use crate::errors::QuakeMapError;

/// A half-open depth interval `[lower_km, next band's lower_km)` with its color.
#[derive(Debug, PartialEq)]
pub struct DepthBand {
    /// Inclusive lower bound in km
    pub lower_km: f64,
    /// CSS hex color
    pub color: &'static str,
    /// Legend label
    pub label: &'static str,
}

/// Depth bands, deepest first. Evaluation order matters: the first band
/// whose lower bound is reached wins.
pub static DEPTH_BANDS: [DepthBand; 5] = [
    DepthBand { lower_km: 90.0, color: "#330000", label: "90+" },
    DepthBand { lower_km: 70.0, color: "#990000", label: "70-90" },
    DepthBand { lower_km: 50.0, color: "#ff1a1a", label: "50-70" },
    DepthBand { lower_km: 30.0, color: "#ff6666", label: "30-50" },
    DepthBand { lower_km: 10.0, color: "#ffcccc", label: "10-30" },
];

/// Label used for depths that fall below every band.
pub const UNCLASSIFIED_LABEL: &str = "unclassified";

/// Result of classifying a depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DepthClass {
    Classified(&'static DepthBand),
    Unclassified,
}

impl DepthClass {
    /// Band color, if any.
    #[must_use]
    pub fn color(self) -> Option<&'static str> {
        match self {
            Self::Classified(band) => Some(band.color),
            Self::Unclassified => None,
        }
    }

    /// Band label, or `"unclassified"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Classified(band) => band.label,
            Self::Unclassified => UNCLASSIFIED_LABEL,
        }
    }

    #[must_use]
    pub fn is_classified(self) -> bool {
        matches!(self, Self::Classified(_))
    }

    /// Color for callers that cannot render without one.
    ///
    /// # Errors
    ///
    /// Returns [`QuakeMapError::DepthUnclassified`] when no band matched.
    pub fn require_color(self, id: &str, depth: f64) -> Result<&'static str, QuakeMapError> {
        self.color().ok_or_else(|| QuakeMapError::DepthUnclassified {
            id: id.to_string(),
            depth,
        })
    }
}

impl Serialize for DepthClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Classify a depth in km.
///
/// NaN compares false against every bound and so comes back unclassified.
#[must_use]
pub fn classify(depth_km: f64) -> DepthClass {
    DEPTH_BANDS
        .iter()
        .find(|band| depth_km >= band.lower_km)
        .map_or(DepthClass::Unclassified, DepthClass::Classified)
}

/// Bands in legend order (shallowest first).
pub fn legend_bands() -> impl Iterator<Item = &'static DepthBand> {
    DEPTH_BANDS.iter().rev()
}

/// Look up a band by its legend label. `"unclassified"` maps to
/// [`DepthClass::Unclassified`].
#[must_use]
pub fn band_by_label(label: &str) -> Option<DepthClass> {
    if label.eq_ignore_ascii_case(UNCLASSIFIED_LABEL) {
        return Some(DepthClass::Unclassified);
    }
    DEPTH_BANDS
        .iter()
        .find(|band| band.label == label)
        .map(DepthClass::Classified)
}
