//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::client::Feed;
use crate::depth::DepthClass;
use crate::filters::{BBox, MarkerFilter, parse_band};
use crate::map::{UnclassifiedPolicy, parse_center};
use crate::output::Format;

/// Map recent earthquakes by depth and magnitude.
#[derive(Parser, Debug)]
#[command(name = "quakemap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the interactive map as a standalone HTML page
    Render(RenderArgs),

    /// Print marker descriptors
    Markers(MarkersArgs),

    /// Print the depth legend
    Legend,

    /// Serve the map page locally
    Serve(ServeArgs),
}

/// Where features come from, and which of them to draw.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// USGS summary feed to fetch
    #[arg(long, default_value = "4.5_month", value_parser = parse_feed)]
    pub feed: Feed,

    /// Read a saved GeoJSON feed instead of fetching
    #[arg(long, short = 'i', conflicts_with = "feed")]
    pub input: Option<PathBuf>,

    /// Minimum magnitude to draw
    #[arg(long)]
    pub min_magnitude: Option<f64>,

    /// Bounding box filter: minlat,minlon,maxlat,maxlon
    #[arg(long, value_parser = parse_bbox)]
    pub bbox: Option<BBox>,

    /// Only draw these depth bands (repeatable): 10-30, 30-50, 50-70, 70-90, 90+, unclassified
    #[arg(long = "band", value_parser = parse_band)]
    pub bands: Vec<DepthClass>,

    /// Handling of events shallower than 10 km: keep, skip, error
    #[arg(long, default_value = "keep", value_parser = parse_policy)]
    pub unclassified: UnclassifiedPolicy,
}

impl SourceArgs {
    #[must_use]
    pub fn filter(&self) -> MarkerFilter {
        MarkerFilter {
            min_magnitude: self.min_magnitude,
            bbox: self.bbox,
            bands: self.bands.clone(),
        }
    }
}

/// Initial map view.
#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Map center: lat,lon
    #[arg(long, default_value = "5.06,130.88", value_parser = parse_center)]
    pub center: [f64; 2],

    /// Initial zoom level
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u8).range(0..=19))]
    pub zoom: u8,
}

/// Arguments for the `render` command.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub view: ViewArgs,

    /// Output file (stdout if omitted)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments for the `markers` command.
#[derive(Parser, Debug)]
pub struct MarkersArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub view: ViewArgs,

    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

fn parse_feed(s: &str) -> Result<Feed, String> {
    s.parse()
}

fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

fn parse_bbox(s: &str) -> Result<BBox, String> {
    s.parse()
}

fn parse_policy(s: &str) -> Result<UnclassifiedPolicy, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_render_defaults() {
        let cli = Cli::try_parse_from(["quakemap", "render"]).unwrap();
        let Command::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.source.feed, Feed::default());
        assert_eq!(args.source.unclassified, UnclassifiedPolicy::Keep);
        assert_eq!(args.view.center, [5.06, 130.88]);
        assert_eq!(args.view.zoom, 5);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_markers_with_filters() {
        let cli = Cli::try_parse_from([
            "quakemap", "markers", "--input", "feed.json", "--band", "90+", "--band", "10-30",
            "--min-magnitude", "5", "-f", "ndjson", "--unclassified", "skip",
        ])
        .unwrap();
        let Command::Markers(args) = cli.command else {
            panic!("expected markers");
        };
        let filter = args.source.filter();
        assert_eq!(filter.bands.len(), 2);
        assert_eq!(filter.min_magnitude, Some(5.0));
        assert_eq!(args.format, Format::Ndjson);
        assert_eq!(args.source.unclassified, UnclassifiedPolicy::Skip);
    }

    #[test]
    fn test_input_conflicts_with_feed() {
        let result = Cli::try_parse_from([
            "quakemap", "render", "--input", "a.json", "--feed", "all_day",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_band_rejected() {
        assert!(Cli::try_parse_from(["quakemap", "markers", "--band", "0-10"]).is_err());
    }
}
