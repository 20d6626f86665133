use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::analyzers::category::Category;
use crate::readings::Pollutant;

/// Inclusive upper bounds for Good..Very Unhealthy; anything above the last is Hazardous.
pub type UpperBounds = [f64; 5];

pub const AQI_BOUNDS: UpperBounds = [50.0, 100.0, 150.0, 200.0, 300.0];
pub const PM25_BOUNDS: UpperBounds = [12.0, 35.4, 55.4, 150.4, 250.4];
pub const PM10_BOUNDS: UpperBounds = [54.0, 154.0, 254.0, 354.0, 424.0];

/// Which breakpoint table maps raw values onto categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakpointTable {
    /// AQI breakpoints applied to every pollutant.
    #[default]
    AqiUniform,
    /// EPA concentration breakpoints per pollutant (µg/m³ for PM).
    EpaPollutantSpecific,
}

impl BreakpointTable {
    pub fn bounds(self, pollutant: Pollutant) -> &'static UpperBounds {
        match (self, pollutant) {
            (BreakpointTable::AqiUniform, _) | (_, Pollutant::Aqi) => &AQI_BOUNDS,
            (BreakpointTable::EpaPollutantSpecific, Pollutant::Pm25) => &PM25_BOUNDS,
            (BreakpointTable::EpaPollutantSpecific, Pollutant::Pm10) => &PM10_BOUNDS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BreakpointTable::AqiUniform => "aqi-uniform",
            BreakpointTable::EpaPollutantSpecific => "epa-pollutant-specific",
        }
    }
}

impl fmt::Display for BreakpointTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BreakpointTable {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aqi-uniform" => Ok(BreakpointTable::AqiUniform),
            "epa-pollutant-specific" => Ok(BreakpointTable::EpaPollutantSpecific),
            other => Err(anyhow::anyhow!(
                "unknown breakpoint table '{other}' (expected aqi-uniform or epa-pollutant-specific)"
            )),
        }
    }
}

/// Settings that control how readings are validated and classified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    pub table: BreakpointTable,
    pub pollutant: Pollutant,
    /// Reject negative values instead of letting them fall into Good.
    pub reject_negative: bool,
    /// Lowest category counted as an alert.
    pub alert_threshold: Category,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            table: BreakpointTable::AqiUniform,
            pollutant: Pollutant::Aqi,
            reject_negative: false,
            alert_threshold: Category::UnhealthyForSensitiveGroups,
        }
    }
}

/// Classifies an AQI value.
///
/// | Range              | Category                       |
/// |--------------------|--------------------------------|
/// | <= 50              | Good                           |
/// | (50, 100]          | Moderate                       |
/// | (100, 150]         | Unhealthy for Sensitive Groups |
/// | (150, 200]         | Unhealthy                      |
/// | (200, 300]         | Very Unhealthy                 |
/// | > 300              | Hazardous                      |
///
/// Negative values are Good. NaN fails every comparison and lands in Hazardous.
pub fn classify(value: f64) -> Category {
    categorize(value, &AQI_BOUNDS)
}

/// Classifies `value` for `pollutant` using the given breakpoint table.
pub fn classify_with(table: BreakpointTable, pollutant: Pollutant, value: f64) -> Category {
    categorize(value, table.bounds(pollutant))
}

fn categorize(value: f64, upper: &UpperBounds) -> Category {
    match value {
        v if v <= upper[0] => Category::Good,
        v if v <= upper[1] => Category::Moderate,
        v if v <= upper[2] => Category::UnhealthyForSensitiveGroups,
        v if v <= upper[3] => Category::Unhealthy,
        v if v <= upper[4] => Category::VeryUnhealthy,
        _ => Category::Hazardous,
    }
}
