//! Error types for quakemap.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

/// Errors that can occur while fetching, decoding or projecting earthquakes.
#[derive(Error, Debug)]
pub enum QuakeMapError {
    /// The feed request could not be completed
    #[error("feed fetch failed: {0}")]
    FetchFailed(#[from] reqwest::Error),

    /// Feed returned a non-success status
    #[error("USGS API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// GeoJSON parsing failed
    #[error("failed to parse GeoJSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Local feed file could not be read
    #[error("failed to read feed file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid response structure
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A feature lacks a field needed to place or size its marker
    #[error("feature {id} is missing {field}")]
    MissingField { id: String, field: &'static str },

    /// A color was required but the depth falls below every band
    #[error("feature {id} has depth {depth} km, below every depth band")]
    DepthUnclassified { id: String, depth: f64 },
}
