//! Output formatting and persistence for aggregation results.
//!
//! Supports pretty-printing, JSON serialization, and the CSV exports the
//! dashboard offered for download.

use anyhow::{Context, Result};
use csv::{Terminator, WriterBuilder};
use serde::Serialize;
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::{AlertSummary, Distribution, DistributionMode, Window};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value as pretty-printed JSON to `path`.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    write_file(path, &body)
}

/// Renders rows as `\n`-separated CSV with no trailing newline.
fn render_rows(rows: &[[String; 2]]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV buffer: {}", e.error()))?;
    let mut text = String::from_utf8(bytes)?;
    while text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Renders a distribution as CSV.
///
/// Percentage mode writes `Category,Percentage` with each row's share of the
/// value sum to one decimal and a `%` suffix (`0` when the sum is zero).
/// Count mode writes `Category,Count`.
pub fn distribution_csv(distribution: &Distribution) -> Result<String> {
    let mut rows = Vec::with_capacity(distribution.items.len() + 1);

    match distribution.mode {
        DistributionMode::Percentage => {
            rows.push(["Category".to_string(), "Percentage".to_string()]);
            let sum = distribution.sum();
            for item in &distribution.items {
                let percent = if sum > 0.0 {
                    format!("{:.1}", item.value / sum * 100.0)
                } else {
                    "0".to_string()
                };
                rows.push([item.category.to_string(), format!("{percent}%")]);
            }
        }
        DistributionMode::Count => {
            rows.push(["Category".to_string(), "Count".to_string()]);
            for item in &distribution.items {
                rows.push([item.category.to_string(), format!("{}", item.value as u64)]);
            }
        }
    }

    render_rows(&rows)
}

/// Renders an alert breakdown as `Level,Count` CSV with a trailing `Total,<n>` row.
pub fn alerts_csv(summary: &AlertSummary) -> Result<String> {
    let mut rows = Vec::with_capacity(summary.breakdown.len() + 2);
    rows.push(["Level".to_string(), "Count".to_string()]);
    for entry in &summary.breakdown {
        rows.push([entry.level.to_string(), entry.count.to_string()]);
    }
    rows.push(["Total".to_string(), summary.total.to_string()]);

    render_rows(&rows)
}

/// Default download name, e.g. `aqi_distribution_<station>_<start>_to_<end>.csv`.
pub fn export_file_name(prefix: &str, station: &str, window: &Window) -> String {
    let station = if station.trim().is_empty() {
        "station"
    } else {
        station
    };
    format!("{}_{}_{}.csv", prefix, station, window.label())
}

/// Writes `contents` to `path`, creating parent directories as needed.
pub fn write_file(path: &str, contents: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory for '{path}'"))?;
        }
    }

    fs::write(path, contents).with_context(|| format!("failed to write '{path}'"))?;
    debug!(path, bytes = contents.len(), "File written");
    Ok(())
}
