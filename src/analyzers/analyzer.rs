use chrono::Utc;
use tracing::{debug, info};

use crate::analyzers::aggregate::{
    CategoryCounts, alerts_from_counts, distribution_from_counts, tally,
};
use crate::analyzers::category::Category;
use crate::analyzers::classify::ClassifierConfig;
use crate::analyzers::error::ValidationError;
use crate::analyzers::types::{DistributionMode, Report, ReportOverview, Window};
use crate::analyzers::utility::{mean, round2};
use crate::readings::Reading;

/// Produces the full station report: overview, percentage distribution and
/// alert breakdown, all from a single pass of classification.
pub fn build_report(
    station_id: &str,
    window: Window,
    readings: &[Reading],
    config: &ClassifierConfig,
) -> Result<Report, ValidationError> {
    let counts = tally(readings, config)?;
    debug!(station_id, readings = readings.len(), "Readings classified");

    let distribution =
        distribution_from_counts(station_id, window, &counts, DistributionMode::Percentage);
    let alerts = alerts_from_counts(station_id, window, &counts, config.alert_threshold);

    let overview = ReportOverview {
        readings: readings.len(),
        average_aqi: round2(mean(
            &readings.iter().map(|r| r.aqi).collect::<Vec<_>>(),
        )),
        average_pm25: average_present(readings.iter().map(|r| r.pm25)),
        average_pm10: average_present(readings.iter().map(|r| r.pm10)),
        dominant_category: dominant_category(&counts),
        alerts: alerts.total,
    };

    info!(
        station_id,
        readings = overview.readings,
        average_aqi = overview.average_aqi,
        alerts = overview.alerts,
        "Report built"
    );

    Ok(Report {
        station_id: station_id.to_string(),
        window,
        generated_at: Utc::now(),
        overview,
        distribution,
        alerts,
    })
}

/// Mean of the values that are present, rounded to two decimals.
fn average_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(round2(mean(&present)))
    }
}

/// Most frequent category. Ties go to the more severe one.
pub fn dominant_category(counts: &CategoryCounts) -> Option<Category> {
    counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .max_by_key(|(category, n)| (*n, *category))
        .map(|(category, _)| category)
}
