//! Reading classification and aggregation.
//!
//! This module maps pollutant readings onto EPA severity categories, tallies
//! them into per-station distributions and alert breakdowns, and assembles
//! the station report.

pub mod aggregate;
pub mod analyzer;
pub mod category;
pub mod classify;
pub mod error;
pub mod types;
pub mod utility;
