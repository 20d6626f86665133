//! Data types produced by the aggregation pipeline.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzers::category::Category;
use crate::analyzers::error::ValidationError;

/// Time range a result is labelled with. Filtering happens upstream.
///
/// Deserialization goes through [`Window::new`], so `start <= end` holds for
/// every value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawWindow> for Window {
    type Error = ValidationError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        Window::new(raw.start, raw.end)
    }
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `hours` leading up to `end`.
    pub fn last_hours(end: DateTime<Utc>, hours: u32) -> Result<Self, ValidationError> {
        let start = end
            .checked_sub_signed(Duration::hours(i64::from(hours)))
            .ok_or(ValidationError::WindowOutOfRange { end, hours })?;
        Ok(Self { start, end })
    }

    /// Short `start_to_end` label used in export file names.
    pub fn label(&self) -> String {
        format!(
            "{}_to_{}",
            self.start.format("%Y-%m-%dT%H:%M"),
            self.end.format("%Y-%m-%dT%H:%M")
        )
    }
}

/// Whether distribution values are raw counts or percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionMode {
    Count,
    Percentage,
}

/// One category's share of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionItem {
    pub category: Category,
    pub value: f64,
}

/// Per-category distribution for one station over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub station_id: String,
    #[serde(flatten)]
    pub window: Window,
    pub mode: DistributionMode,
    /// Number of readings the distribution was computed from.
    pub total: usize,
    #[serde(rename = "distribution")]
    pub items: Vec<DistributionItem>,
}

impl Distribution {
    pub fn value_of(&self, category: Category) -> Option<f64> {
        self.items
            .iter()
            .find(|item| item.category == category)
            .map(|item| item.value)
    }

    pub fn sum(&self) -> f64 {
        self.items.iter().map(|item| item.value).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertLevelCount {
    pub level: Category,
    pub count: usize,
}

/// Readings at or above the alert threshold, broken down by level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    pub station_id: String,
    #[serde(flatten)]
    pub window: Window,
    pub total: usize,
    pub breakdown: Vec<AlertLevelCount>,
}

/// Headline figures for a station report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOverview {
    pub readings: usize,
    pub average_aqi: f64,
    pub average_pm25: Option<f64>,
    pub average_pm10: Option<f64>,
    pub dominant_category: Option<Category>,
    pub alerts: usize,
}

/// Complete station report, written out as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub station_id: String,
    #[serde(flatten)]
    pub window: Window,
    pub generated_at: DateTime<Utc>,
    pub overview: ReportOverview,
    pub distribution: Distribution,
    pub alerts: AlertSummary,
}
