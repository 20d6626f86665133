//! Runtime settings.
//!
//! Values come from an optional JSON file, then environment variables (a
//! `.env` file is honoured by the binary), then command-line flags.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::analyzers::category::Category;
use crate::analyzers::classify::{BreakpointTable, ClassifierConfig};
use crate::readings::Pollutant;

pub const ENV_API_BASE_URL: &str = "AQI_API_BASE_URL";
pub const ENV_BREAKPOINT_TABLE: &str = "AQI_BREAKPOINT_TABLE";
pub const ENV_POLLUTANT: &str = "AQI_POLLUTANT";
pub const ENV_REJECT_NEGATIVE: &str = "AQI_REJECT_NEGATIVE";

/// Settings file contents:
/// ```json
/// {
///   "api_base_url": "http://localhost:8080/xp/api/v1",
///   "breakpoint_table": "epa-pollutant-specific",
///   "pollutant": "pm25",
///   "reject_negative": true,
///   "alert_threshold": "Unhealthy for Sensitive Groups",
///   "range_hours": 24
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: Option<String>,
    pub breakpoint_table: BreakpointTable,
    pub pollutant: Pollutant,
    pub reject_negative: bool,
    pub alert_threshold: Category,
    pub range_hours: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let classifier = ClassifierConfig::default();
        Self {
            api_base_url: None,
            breakpoint_table: classifier.table,
            pollutant: classifier.pollutant,
            reject_negative: classifier.reject_negative,
            alert_threshold: classifier.alert_threshold,
            range_hours: 24,
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file at `path`. Missing keys keep their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{path}'"))?;
        let settings = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse settings file '{path}'"))?;
        debug!(path, "Settings loaded");
        Ok(settings)
    }

    /// Applies overrides from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(table) = lookup(ENV_BREAKPOINT_TABLE) {
            self.breakpoint_table = table
                .parse()
                .with_context(|| format!("invalid {ENV_BREAKPOINT_TABLE}"))?;
        }
        if let Some(pollutant) = lookup(ENV_POLLUTANT) {
            self.pollutant = pollutant
                .parse()
                .with_context(|| format!("invalid {ENV_POLLUTANT}"))?;
        }
        if let Some(flag) = lookup(ENV_REJECT_NEGATIVE) {
            self.reject_negative = parse_flag(&flag)
                .with_context(|| format!("invalid {ENV_REJECT_NEGATIVE}"))?;
        }
        Ok(self)
    }

    pub fn classifier(&self) -> ClassifierConfig {
        ClassifierConfig {
            table: self.breakpoint_table,
            pollutant: self.pollutant,
            reject_negative: self.reject_negative,
            alert_threshold: self.alert_threshold,
        }
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow::anyhow!("expected a boolean, got '{other}'")),
    }
}
