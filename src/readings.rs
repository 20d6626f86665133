use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;
use std::str::FromStr;

use crate::parser::parse_timestamp;

/// Pollutant field a reading is classified by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    #[default]
    Aqi,
    Pm25,
    Pm10,
}

impl Pollutant {
    pub fn as_str(self) -> &'static str {
        match self {
            Pollutant::Aqi => "aqi",
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pollutant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aqi" => Ok(Pollutant::Aqi),
            "pm25" | "pm2.5" => Ok(Pollutant::Pm25),
            "pm10" => Ok(Pollutant::Pm10),
            other => Err(anyhow::anyhow!(
                "unknown pollutant '{other}' (expected aqi, pm25 or pm10)"
            )),
        }
    }
}

/// A single sensor observation as served by the monitoring backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(
        rename = "timeStamp",
        alias = "timestamp",
        default,
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    pub aqi: f64,
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
}

impl Reading {
    pub fn new(aqi: f64) -> Self {
        Reading {
            aqi,
            ..Default::default()
        }
    }

    pub fn with_particulates(mut self, pm25: f64, pm10: f64) -> Self {
        self.pm25 = Some(pm25);
        self.pm10 = Some(pm10);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Returns the value recorded for `pollutant`, if the reading carries one.
    pub fn value(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Aqi => Some(self.aqi),
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
        }
    }
}

/// Accepts RFC 3339 strings, naive date-times, plain dates or epoch milliseconds.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("timestamp {n} is out of range"))),
        Some(serde_json::Value::String(s)) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("unrecognised timestamp '{s}'"))),
        Some(other) => Err(de::Error::custom(format!(
            "timestamp must be a string or number, got {other}"
        ))),
    }
}
