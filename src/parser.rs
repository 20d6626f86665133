//! JSON parsing for backend reading payloads.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::readings::Reading;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Decodes a list of [`Reading`]s from raw JSON bytes.
///
/// The backend wraps payloads in a `data` envelope; a bare array is accepted
/// too.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON, the payload holds no reading
/// array, or any element fails to deserialize. The error names the index of
/// the offending element.
pub fn parse_readings(bytes: &[u8]) -> Result<Vec<Reading>> {
    let payload: Value = serde_json::from_slice(bytes).context("payload is not valid JSON")?;

    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => items,
            Some(_) => bail!("`data` envelope does not contain an array"),
            None => bail!("payload object has no `data` envelope"),
        },
        _ => bail!("payload must be an array or a `data` envelope"),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).with_context(|| format!("reading #{index} is malformed"))
        })
        .collect()
}

/// Parses a timestamp in any of the shapes the dashboard produces.
///
/// Naive values (no offset) are taken as UTC. A bare date maps to midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_data_envelope() {
        let json = br#"{"data":[{"aqi":10},{"aqi":60.5,"pm25":18.2}]}"#;
        let readings = parse_readings(json).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].aqi, 60.5);
        assert_eq!(readings[1].pm25, Some(18.2));
    }

    #[test]
    fn test_parse_bare_array() {
        let readings = parse_readings(br#"[{"aqi":1},{"aqi":2},{"aqi":3}]"#).unwrap();
        assert_eq!(readings.len(), 3);
    }

    #[test]
    fn test_parse_empty_envelope() {
        let readings = parse_readings(br#"{"data":[]}"#).unwrap();
        assert!(readings.is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_readings(&[0xFF, 0xFE, 0x00]).is_err());
    }

    #[test]
    fn test_parse_missing_envelope() {
        let err = parse_readings(br#"{"readings":[]}"#).unwrap_err();
        assert!(err.to_string().contains("data"));
    }

    #[test]
    fn test_parse_names_malformed_index() {
        let err = parse_readings(br#"{"data":[{"aqi":10},{"aqi":"n/a"}]}"#).unwrap_err();
        assert!(err.to_string().contains("reading #1"));
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        let expected = Utc.with_ymd_and_hms(2025, 10, 1, 8, 30, 0).unwrap();

        assert_eq!(parse_timestamp("2025-10-01T08:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-10-01T10:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-10-01T08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-10-01T08:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2025-10-01T08:30"), Some(expected));
        assert_eq!(parse_timestamp("2025-10-01 08:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-10-01"),
            Some(Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("last tuesday"), None);
    }
}
