use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::readings::Pollutant;

/// Reasons a batch of readings cannot be aggregated.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("reading #{index}: {pollutant} value {value} is not a finite number")]
    NonFinite {
        index: usize,
        pollutant: Pollutant,
        value: f64,
    },
    #[error("reading #{index}: no {pollutant} value present")]
    Missing { index: usize, pollutant: Pollutant },
    #[error("reading #{index}: {pollutant} value {value} is negative")]
    Negative {
        index: usize,
        pollutant: Pollutant,
        value: f64,
    },
    #[error("a window of {hours} hours before {end} is out of range")]
    WindowOutOfRange { end: DateTime<Utc>, hours: u32 },
    #[error("window start {start} is after window end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}
