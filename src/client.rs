//! USGS summary feed access.
//!
//! One blocking HTTP fetch per run (reqwest with rustls), or a GeoJSON file
//! read from disk for offline rendering.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::errors::QuakeMapError;
use crate::models::FeatureCollection;

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("quakemap/", env!("CARGO_PKG_VERSION"));

/// USGS base URL for earthquake feeds.
const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Magnitude threshold of a summary feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    All,
    M1,
    M2_5,
    M4_5,
    Significant,
}

impl Threshold {
    const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::M1 => "1.0",
            Self::M2_5 => "2.5",
            Self::M4_5 => "4.5",
            Self::Significant => "significant",
        }
    }
}

/// Time window of a summary feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Hour,
    Day,
    Week,
    Month,
}

impl Window {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

/// A USGS summary feed, e.g. `4.5_month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feed {
    pub threshold: Threshold,
    pub window: Window,
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            threshold: Threshold::M4_5,
            window: Window::Month,
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.threshold.as_str(), self.window.as_str())
    }
}

impl FromStr for Feed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let (threshold, window) = lower
            .rsplit_once('_')
            .ok_or_else(|| format!("unknown feed: {s} (expected e.g. 4.5_month)"))?;

        let threshold = match threshold {
            "all" => Threshold::All,
            "1.0" | "1" => Threshold::M1,
            "2.5" => Threshold::M2_5,
            "4.5" => Threshold::M4_5,
            "significant" => Threshold::Significant,
            other => return Err(format!("unknown feed threshold: {other}")),
        };
        let window = match window {
            "hour" => Window::Hour,
            "day" => Window::Day,
            "week" => Window::Week,
            "month" => Window::Month,
            other => return Err(format!("unknown feed window: {other}")),
        };

        Ok(Self { threshold, window })
    }
}

/// Client for USGS earthquake feeds.
pub struct FeedClient {
    client: Client,
    base_url: String,
}

impl FeedClient {
    /// Create a new feed client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, QuakeMapError> {
        Self::with_base_url(USGS_BASE_URL)
    }

    /// Create a client against a different host (mirrors, local fixtures).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_base_url(base_url: &str) -> Result<Self, QuakeMapError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of a summary feed.
    #[must_use]
    pub fn feed_url(&self, feed: Feed) -> String {
        format!("{}/earthquakes/feed/v1.0/summary/{feed}.geojson", self.base_url)
    }

    /// Fetch a summary GeoJSON feed. There is no retry.
    ///
    /// # Errors
    ///
    /// Returns [`QuakeMapError::FetchFailed`] on transport failure,
    /// [`QuakeMapError::Api`] on a non-success status, and a parse error if
    /// the body is not a feature collection.
    #[instrument(skip(self), fields(feed = %feed))]
    pub fn fetch(&self, feed: Feed) -> Result<FeatureCollection, QuakeMapError> {
        let url = self.feed_url(feed);
        debug!("fetching feed from {}", url);

        let response = self.client.get(&url).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(QuakeMapError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text()?;
        let collection = parse_collection(&body)?;

        debug!("fetched {} features", collection.features.len());
        Ok(collection)
    }
}

/// Parse and validate a GeoJSON feature collection.
///
/// # Errors
///
/// Returns an error if the text is not JSON or not a `FeatureCollection`.
pub fn parse_collection(body: &str) -> Result<FeatureCollection, QuakeMapError> {
    let collection: FeatureCollection = serde_json::from_str(body)?;
    collection.validate()?;
    Ok(collection)
}

/// Load a feature collection saved from a feed.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
#[instrument]
pub fn load_file(path: &Path) -> Result<FeatureCollection, QuakeMapError> {
    let body = std::fs::read_to_string(path)?;
    let collection = parse_collection(&body)?;
    debug!("loaded {} features", collection.features.len());
    Ok(collection)
}
