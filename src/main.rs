//! CLI entry point for the AQI distribution tool.
//!
//! Provides subcommands for classifying single values and for turning a
//! station's readings into a category distribution, an alert breakdown, or a
//! full report.

use anyhow::{Context, Result, bail};
use aqi_distribution::analyzers::aggregate::{
    aggregate_distribution, classify_value, summarize_alerts,
};
use aqi_distribution::analyzers::analyzer::build_report;
use aqi_distribution::analyzers::classify::BreakpointTable;
use aqi_distribution::analyzers::types::{DistributionMode, Window};
use aqi_distribution::config::Settings;
use aqi_distribution::readings::{Pollutant, Reading};
use aqi_distribution::{
    fetch::{BasicClient, fetch_bytes, readings_url},
    output::{alerts_csv, distribution_csv, export_file_name, print_json, write_file, write_json},
    parser::{parse_readings, parse_timestamp},
};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "aqi_distribution")]
#[command(about = "Classify air-quality readings and summarize them per AQI category", long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand that works on a station's readings.
#[derive(Args)]
struct ReadingArgs {
    /// Path to a JSON file or URL; defaults to the backend readings endpoint
    #[arg(short, long, value_name = "FILE_OR_URL")]
    source: Option<String>,

    /// Station / sensor identifier
    #[arg(long, default_value = "1")]
    station: String,

    /// Window start (RFC 3339, YYYY-MM-DDTHH:MM or YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Window end; defaults to now
    #[arg(long)]
    end: Option<String>,

    /// Hours of history to request and to label the window with
    #[arg(long)]
    range_hours: Option<u32>,

    #[command(flatten)]
    classifier: ClassifierArgs,
}

#[derive(Args)]
struct ClassifierArgs {
    /// Pollutant to classify (aqi, pm25, pm10)
    #[arg(short, long)]
    pollutant: Option<Pollutant>,

    /// Breakpoint table (aqi-uniform, epa-pollutant-specific)
    #[arg(short, long)]
    table: Option<BreakpointTable>,

    /// Reject negative values instead of treating them as Good
    #[arg(long, default_value_t = false)]
    reject_negative: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single value
    Classify {
        #[arg(allow_negative_numbers = true)]
        value: f64,

        #[command(flatten)]
        classifier: ClassifierArgs,
    },
    /// Category distribution of a station's readings
    Distribution {
        #[command(flatten)]
        readings: ReadingArgs,

        /// Emit percentages instead of raw counts
        #[arg(long, default_value_t = false)]
        percent: bool,

        /// Write CSV here; "auto" uses the default export name
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Alert breakdown for readings at or above the alert threshold
    Alerts {
        #[command(flatten)]
        readings: ReadingArgs,

        /// Write CSV here; "auto" uses the default export name
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Full station report as JSON
    Report {
        #[command(flatten)]
        readings: ReadingArgs,

        /// Write the JSON report here instead of logging it
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/aqi_distribution.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("aqi_distribution.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    }
    .with_env()?;
    debug!(?settings, "Settings resolved");

    match cli.command {
        Commands::Classify { value, classifier } => {
            let settings = classifier.apply(settings);
            let category = classify_value(value, &settings.classifier())?;
            info!(
                value,
                pollutant = %settings.pollutant,
                table = %settings.breakpoint_table,
                category = %category,
                "Classified"
            );
            println!("{category}");
        }
        Commands::Distribution {
            readings,
            percent,
            output,
        } => {
            let (settings, station, window, rows) = readings.load(settings).await?;
            let mode = if percent {
                DistributionMode::Percentage
            } else {
                DistributionMode::Count
            };

            let distribution =
                aggregate_distribution(&station, window, &rows, mode, &settings.classifier())?;
            info!(
                station = %station,
                readings = distribution.total,
                ?mode,
                "Distribution computed"
            );

            match output {
                Some(path) => {
                    let path = resolve_output(path, "aqi_distribution", &station, &window);
                    write_file(&path, &distribution_csv(&distribution)?)?;
                    info!(path = %path, "Distribution CSV written");
                }
                None => print_json(&distribution)?,
            }
        }
        Commands::Alerts { readings, output } => {
            let (settings, station, window, rows) = readings.load(settings).await?;

            let summary = summarize_alerts(&station, window, &rows, &settings.classifier())?;
            if summary.total > 0 {
                warn!(station = %station, alerts = summary.total, "Readings above alert threshold");
            }

            match output {
                Some(path) => {
                    let path = resolve_output(path, "alerts_summary", &station, &window);
                    write_file(&path, &alerts_csv(&summary)?)?;
                    info!(path = %path, "Alert CSV written");
                }
                None => print_json(&summary)?,
            }
        }
        Commands::Report { readings, output } => {
            let (settings, station, window, rows) = readings.load(settings).await?;

            let report = build_report(&station, window, &rows, &settings.classifier())?;

            match output {
                Some(path) => {
                    write_json(&path, &report)?;
                    info!(path = %path, "Report written");
                }
                None => print_json(&report)?,
            }
        }
    }

    Ok(())
}

impl ClassifierArgs {
    /// Layers command-line flags over the resolved settings.
    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(pollutant) = self.pollutant {
            settings.pollutant = pollutant;
        }
        if let Some(table) = self.table {
            settings.breakpoint_table = table;
        }
        if self.reject_negative {
            settings.reject_negative = true;
        }
        settings
    }
}

impl ReadingArgs {
    /// Resolves settings and window, then loads and parses the readings.
    async fn load(self, settings: Settings) -> Result<(Settings, String, Window, Vec<Reading>)> {
        let mut settings = self.classifier.apply(settings);
        if let Some(hours) = self.range_hours {
            settings.range_hours = hours;
        }

        let end = match &self.end {
            Some(raw) => parse_bound(raw, "end")?,
            None => Utc::now(),
        };
        let window = match &self.start {
            Some(raw) => Window::new(parse_bound(raw, "start")?, end)?,
            None => Window::last_hours(end, settings.range_hours)?,
        };

        let source = match self.source {
            Some(source) => source,
            None => match &settings.api_base_url {
                Some(base) => readings_url(base, &self.station, settings.range_hours),
                None => bail!(
                    "no --source given and {} is not set",
                    aqi_distribution::config::ENV_API_BASE_URL
                ),
            },
        };

        let bytes = fetcher(&source).await?;
        let readings = parse_readings(&bytes)
            .with_context(|| format!("failed to parse readings from '{source}'"))?;
        info!(
            station = %self.station,
            readings = readings.len(),
            start = %window.start,
            end = %window.end,
            "Readings loaded"
        );

        Ok((settings, self.station, window, readings))
    }
}

fn parse_bound(raw: &str, which: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(raw).with_context(|| format!("unrecognised {which} time '{raw}'"))
}

/// Maps the "auto" placeholder onto the default export file name.
fn resolve_output(path: String, prefix: &str, station: &str, window: &Window) -> String {
    if path == "auto" {
        export_file_name(prefix, station, window)
    } else {
        path
    }
}

/// Loads reading data from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %url))]
async fn fetcher(url: &str) -> Result<Vec<u8>> {
    let bytes = if url.starts_with("http") {
        let client = BasicClient::new()?;
        fetch_bytes(&client, url).await?
    } else {
        std::fs::read(url).with_context(|| format!("failed to read '{url}'"))?
    };
    Ok(bytes)
}
