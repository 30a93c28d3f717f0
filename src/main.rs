//! quakemap - earthquake feeds on an interactive map.
//!
//! Fetches a USGS GeoJSON summary feed once, colors each event by depth band
//! and sizes it by magnitude, and emits a Leaflet page with a layer control
//! and a depth legend.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};

mod cli;
mod client;
mod depth;
mod errors;
mod filters;
mod map;
mod models;
mod output;
mod projector;
mod server;

use cli::{Cli, Command, SourceArgs, ViewArgs};
use client::FeedClient;
use map::{MapDocument, MapView, OverlaySummary, build_overlay};
use models::FeatureCollection;
use projector::MarkerDescriptor;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Render(args) => cmd_render(&args),
        Command::Markers(args) => cmd_markers(&args),
        Command::Legend => cmd_legend(),
        Command::Serve(args) => cmd_serve(&args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Fetch or load the feed named by the source arguments.
fn load_features(source: &SourceArgs) -> Result<FeatureCollection> {
    if let Some(path) = &source.input {
        return client::load_file(path)
            .with_context(|| format!("failed to load {}", path.display()));
    }

    let client = FeedClient::new().context("failed to create feed client")?;
    client
        .fetch(source.feed)
        .with_context(|| format!("failed to fetch {} feed", source.feed))
}

/// Load, filter and project the features for one session.
fn load_markers(source: &SourceArgs) -> Result<(Vec<MarkerDescriptor>, OverlaySummary, String)> {
    let collection = load_features(source)?;
    if let Some(meta) = &collection.metadata {
        let generated = meta
            .generated
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
            .map_or_else(|| "unknown".to_string(), |t| t.to_rfc3339());
        debug!("feed generated {} with {:?} events", generated, meta.count);
    }

    let title = collection
        .metadata
        .as_ref()
        .and_then(|m| m.title.clone())
        .unwrap_or_else(|| "Earthquakes".to_string());

    let (markers, summary) = build_overlay(&collection, &source.filter(), source.unclassified)
        .context("failed to build earthquake overlay")?;

    info!(
        "{} of {} events mapped ({} invalid, {} filtered out)",
        summary.rendered, summary.total, summary.invalid, summary.filtered
    );
    Ok((markers, summary, title))
}

fn map_view(view: &ViewArgs) -> MapView {
    MapView {
        center: view.center,
        zoom: view.zoom,
    }
}

/// Execute the `render` command - write the HTML page.
fn cmd_render(args: &cli::RenderArgs) -> Result<()> {
    let (markers, _, title) = load_markers(&args.source)?;
    let html = MapDocument::new(title, map_view(&args.view), markers)
        .render_html()
        .context("failed to render map page")?;

    match &args.output {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
            info!("map written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(html.as_bytes())?;
            handle.flush()?;
        }
    }
    Ok(())
}

/// Execute the `markers` command - print marker descriptors.
fn cmd_markers(args: &cli::MarkersArgs) -> Result<()> {
    let (markers, _, _) = load_markers(&args.source)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_markers(&mut handle, &markers, args.format)?;
    Ok(())
}

/// Execute the `legend` command.
fn cmd_legend() -> Result<()> {
    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let mut handle = stdout.lock();
    output::write_legend(&mut handle, color)?;
    Ok(())
}

/// Execute the `serve` command - build the map once, then serve it.
fn cmd_serve(args: &cli::ServeArgs) -> Result<()> {
    // Blocking fetch happens before the runtime exists.
    let (markers, summary, title) = load_markers(&args.source)?;
    let state = server::AppState::new(
        MapDocument::new(title, map_view(&args.view), markers),
        summary,
    );

    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
    };

    let url = format!("http://{}:{}", config.host, config.port);
    println!("\x1b[1m🌍 quakemap\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  Markers: {}", summary.rendered);
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config, state))
}
