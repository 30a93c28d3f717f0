//! Output formatters for marker descriptors.
//!
//! Supports human-readable (colored by depth band), JSON, and NDJSON formats.

use std::io::{self, Write};

use crate::depth::{DepthClass, legend_bands};
use crate::projector::MarkerDescriptor;

// ANSI codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// 24-bit foreground escape for a `#rrggbb` color.
fn ansi_fg(hex: &str) -> Option<String> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(format!("\x1b[38;2;{};{};{}m", channel(0)?, channel(2)?, channel(4)?))
}

fn band_color(band: DepthClass) -> String {
    band.color().and_then(ansi_fg).unwrap_or_default()
}

/// Write markers in human-readable form, one row per marker.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, markers: &[MarkerDescriptor]) -> io::Result<()> {
    for marker in markers {
        let color = band_color(marker.band);
        let label = marker.band.label();
        let swatch = if marker.band.is_classified() { "●" } else { "○" };

        writeln!(
            writer,
            "{color}{swatch}{RESET} {BOLD}M{:.1}{RESET} │ \
             {DIM}{:>6.1}km{RESET} │ \
             {color}{label:<12}{RESET} │ \
             r={:>7.0}m │ \
             {:>8.3},{:>9.3} │ {}",
            marker.magnitude,
            marker.depth_km,
            marker.radius,
            marker.latitude(),
            marker.longitude(),
            marker.id,
        )?;
    }
    Ok(())
}

/// Write markers as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, markers: &[MarkerDescriptor]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(markers)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write markers as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, markers: &[MarkerDescriptor]) -> io::Result<()> {
    for marker in markers {
        let json = serde_json::to_string(marker)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write markers in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_markers<W: Write>(
    writer: &mut W,
    markers: &[MarkerDescriptor],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, markers),
        Format::Json => write_json(writer, markers),
        Format::Ndjson => write_ndjson(writer, markers),
    }
}

/// Print the depth legend.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_legend<W: Write>(writer: &mut W, color: bool) -> io::Result<()> {
    writeln!(writer, "{BOLD}Earthquake Depth{RESET}")?;
    for band in legend_bands() {
        let fg = if color { ansi_fg(band.color).unwrap_or_default() } else { String::new() };
        writeln!(writer, "  {fg}■{RESET} {:<6} km  {}", band.label, band.color)?;
    }
    writeln!(writer, "  {DIM}□ <10 km: unclassified{RESET}")
}
