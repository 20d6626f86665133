use crate::analyzers::category::Category;
use crate::analyzers::classify::{ClassifierConfig, classify_with};
use crate::analyzers::error::ValidationError;
use crate::analyzers::types::{
    AlertLevelCount, AlertSummary, Distribution, DistributionItem, DistributionMode, Window,
};
use crate::analyzers::utility::percent_of;
use crate::readings::Reading;

/// One counter per [`Category`], indexed by [`Category::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts([usize; 6]);

impl CategoryCounts {
    pub fn increment(&mut self, category: Category) {
        self.0[category.index()] += 1;
    }

    pub fn get(&self, category: Category) -> usize {
        self.0[category.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// `(category, count)` pairs in canonical order, zero counts included.
    pub fn iter(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        Category::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// Checks the configured pollutant of reading `index` and returns its value.
fn checked_value(
    index: usize,
    reading: &Reading,
    config: &ClassifierConfig,
) -> Result<f64, ValidationError> {
    let pollutant = config.pollutant;
    let value = reading
        .value(pollutant)
        .ok_or(ValidationError::Missing { index, pollutant })?;

    validate(index, value, config)
}

fn validate(index: usize, value: f64, config: &ClassifierConfig) -> Result<f64, ValidationError> {
    let pollutant = config.pollutant;
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            index,
            pollutant,
            value,
        });
    }
    if config.reject_negative && value < 0.0 {
        return Err(ValidationError::Negative {
            index,
            pollutant,
            value,
        });
    }

    Ok(value)
}

/// Validates and classifies a single value with the same rules [`tally`] applies.
pub fn classify_value(value: f64, config: &ClassifierConfig) -> Result<Category, ValidationError> {
    let value = validate(0, value, config)?;
    Ok(classify_with(config.table, config.pollutant, value))
}

/// Classifies every reading and counts how many fall in each category.
///
/// Fails on the first reading that does not pass validation.
pub fn tally(readings: &[Reading], config: &ClassifierConfig) -> Result<CategoryCounts, ValidationError> {
    let mut counts = CategoryCounts::default();

    for (index, reading) in readings.iter().enumerate() {
        let value = checked_value(index, reading, config)?;
        counts.increment(classify_with(config.table, config.pollutant, value));
    }

    Ok(counts)
}

/// Builds a [`Distribution`] from already tallied counts.
///
/// Count mode always yields six items. Percentage mode yields an empty list
/// when there is nothing to divide by.
pub fn distribution_from_counts(
    station_id: &str,
    window: Window,
    counts: &CategoryCounts,
    mode: DistributionMode,
) -> Distribution {
    let total = counts.total();

    let items = match mode {
        DistributionMode::Count => counts
            .iter()
            .map(|(category, n)| DistributionItem {
                category,
                value: n as f64,
            })
            .collect(),
        DistributionMode::Percentage if total == 0 => Vec::new(),
        DistributionMode::Percentage => counts
            .iter()
            .map(|(category, n)| DistributionItem {
                category,
                value: percent_of(n, total),
            })
            .collect(),
    };

    Distribution {
        station_id: station_id.to_string(),
        window,
        mode,
        total,
        items,
    }
}

/// Aggregates readings into a per-category [`Distribution`] for one station.
pub fn aggregate_distribution(
    station_id: &str,
    window: Window,
    readings: &[Reading],
    mode: DistributionMode,
    config: &ClassifierConfig,
) -> Result<Distribution, ValidationError> {
    let counts = tally(readings, config)?;
    Ok(distribution_from_counts(station_id, window, &counts, mode))
}

/// Builds an [`AlertSummary`] from already tallied counts.
pub fn alerts_from_counts(
    station_id: &str,
    window: Window,
    counts: &CategoryCounts,
    threshold: Category,
) -> AlertSummary {
    let breakdown: Vec<AlertLevelCount> = counts
        .iter()
        .filter(|(category, _)| *category >= threshold)
        .map(|(level, count)| AlertLevelCount { level, count })
        .collect();

    AlertSummary {
        station_id: station_id.to_string(),
        window,
        total: breakdown.iter().map(|b| b.count).sum(),
        breakdown,
    }
}

/// Counts readings at or above the configured alert threshold.
pub fn summarize_alerts(
    station_id: &str,
    window: Window,
    readings: &[Reading],
    config: &ClassifierConfig,
) -> Result<AlertSummary, ValidationError> {
    let counts = tally(readings, config)?;
    Ok(alerts_from_counts(
        station_id,
        window,
        &counts,
        config.alert_threshold,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::classify::BreakpointTable;
    use crate::readings::Pollutant;
    use chrono::{TimeZone, Utc};

    fn window() -> Window {
        Window::new(
            Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 7, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn readings(values: &[f64]) -> Vec<Reading> {
        values.iter().map(|&v| Reading::new(v)).collect()
    }

    fn categories(d: &Distribution) -> Vec<Category> {
        d.items.iter().map(|i| i.category).collect()
    }

    #[test]
    fn test_one_reading_per_category() {
        let input = readings(&[10.0, 60.0, 110.0, 160.0, 250.0, 350.0]);
        let config = ClassifierConfig::default();

        let counts = aggregate_distribution("s1", window(), &input, DistributionMode::Count, &config)
            .unwrap();
        assert_eq!(categories(&counts), Category::ALL.to_vec());
        assert!(counts.items.iter().all(|i| i.value == 1.0));

        let pct =
            aggregate_distribution("s1", window(), &input, DistributionMode::Percentage, &config)
                .unwrap();
        assert_eq!(categories(&pct), Category::ALL.to_vec());
        assert!(pct.items.iter().all(|i| i.value == 16.67));
        assert!((pct.sum() - 100.0).abs() <= 0.1);
    }

    #[test]
    fn test_all_good() {
        let input = readings(&[10.0, 10.0, 10.0]);
        let config = ClassifierConfig::default();

        let counts = aggregate_distribution("s1", window(), &input, DistributionMode::Count, &config)
            .unwrap();
        assert_eq!(counts.value_of(Category::Good), Some(3.0));
        for c in &Category::ALL[1..] {
            assert_eq!(counts.value_of(*c), Some(0.0));
        }

        let pct =
            aggregate_distribution("s1", window(), &input, DistributionMode::Percentage, &config)
                .unwrap();
        assert_eq!(pct.value_of(Category::Good), Some(100.0));
        for c in &Category::ALL[1..] {
            assert_eq!(pct.value_of(*c), Some(0.0));
        }
    }

    #[test]
    fn test_empty_input_counts_are_all_zero() {
        let d = aggregate_distribution(
            "s1",
            window(),
            &[],
            DistributionMode::Count,
            &ClassifierConfig::default(),
        )
        .unwrap();

        assert_eq!(d.total, 0);
        assert_eq!(categories(&d), Category::ALL.to_vec());
        assert!(d.items.iter().all(|i| i.value == 0.0));
    }

    #[test]
    fn test_empty_input_percentages_are_empty() {
        let d = aggregate_distribution(
            "s1",
            window(),
            &[],
            DistributionMode::Percentage,
            &ClassifierConfig::default(),
        )
        .unwrap();

        assert_eq!(d.total, 0);
        assert!(d.items.is_empty());
    }

    #[test]
    fn test_order_is_canonical_regardless_of_input_order() {
        let input = readings(&[350.0, 12.0, 180.0, 350.0, 75.0]);
        let d = aggregate_distribution(
            "s1",
            window(),
            &input,
            DistributionMode::Count,
            &ClassifierConfig::default(),
        )
        .unwrap();

        assert_eq!(categories(&d), Category::ALL.to_vec());
        assert_eq!(d.value_of(Category::Hazardous), Some(2.0));
        assert_eq!(d.value_of(Category::UnhealthyForSensitiveGroups), Some(0.0));
    }

    #[test]
    fn test_counts_sum_to_len_and_percentages_to_100() {
        let config = ClassifierConfig::default();
        let mut values = Vec::new();
        let mut v = 0.0;
        for n in 1..=97 {
            v = (v + 37.3) % 420.0;
            values.push(v);

            let input = readings(&values);
            let counts = tally(&input, &config).unwrap();
            assert_eq!(counts.total(), n);

            let pct = distribution_from_counts("s1", window(), &counts, DistributionMode::Percentage);
            assert!((pct.sum() - 100.0).abs() <= 0.1, "sum {} for n={n}", pct.sum());
        }
    }

    #[test]
    fn test_distribution_is_tagged() {
        let d = aggregate_distribution(
            "sensor-7",
            window(),
            &readings(&[5.0]),
            DistributionMode::Count,
            &ClassifierConfig::default(),
        )
        .unwrap();

        assert_eq!(d.station_id, "sensor-7");
        assert_eq!(d.window, window());
        assert_eq!(d.mode, DistributionMode::Count);
    }

    #[test]
    fn test_nan_is_rejected() {
        let input = readings(&[10.0, f64::NAN]);
        let err = tally(&input, &ClassifierConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NonFinite {
                index: 1,
                pollutant: Pollutant::Aqi,
                ..
            }
        ));
    }

    #[test]
    fn test_infinity_is_rejected() {
        let input = readings(&[f64::INFINITY]);
        let err = tally(&input, &ClassifierConfig::default()).unwrap_err();
        assert!(matches!(err, ValidationError::NonFinite { index: 0, .. }));
        assert!(err.to_string().contains("reading #0"));
    }

    #[test]
    fn test_negative_is_good_by_default() {
        let counts = tally(&readings(&[-5.0]), &ClassifierConfig::default()).unwrap();
        assert_eq!(counts.get(Category::Good), 1);
    }

    #[test]
    fn test_negative_rejected_when_strict() {
        let config = ClassifierConfig {
            reject_negative: true,
            ..Default::default()
        };
        let err = tally(&readings(&[3.0, -5.0]), &config).unwrap_err();
        assert!(matches!(err, ValidationError::Negative { index: 1, .. }));
    }

    #[test]
    fn test_classify_value_applies_validation() {
        let strict = ClassifierConfig {
            reject_negative: true,
            ..Default::default()
        };

        assert_eq!(
            classify_value(-5.0, &ClassifierConfig::default()).unwrap(),
            Category::Good
        );
        assert!(matches!(
            classify_value(-5.0, &strict).unwrap_err(),
            ValidationError::Negative { .. }
        ));
        assert!(matches!(
            classify_value(f64::NAN, &ClassifierConfig::default()).unwrap_err(),
            ValidationError::NonFinite { .. }
        ));
        assert!(matches!(
            classify_value(f64::INFINITY, &ClassifierConfig::default()).unwrap_err(),
            ValidationError::NonFinite { .. }
        ));
        assert_eq!(
            classify_value(160.0, &strict).unwrap(),
            Category::Unhealthy
        );
    }

    #[test]
    fn test_missing_pollutant_is_rejected() {
        let config = ClassifierConfig {
            pollutant: Pollutant::Pm25,
            ..Default::default()
        };
        let input = vec![Reading::new(20.0).with_particulates(8.0, 20.0), Reading::new(20.0)];
        let err = tally(&input, &config).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Missing {
                index: 1,
                pollutant: Pollutant::Pm25
            }
        ));
    }

    #[test]
    fn test_breakpoint_table_changes_pm25_result() {
        let input = vec![Reading::new(20.0).with_particulates(40.0, 20.0)];

        let uniform = ClassifierConfig {
            pollutant: Pollutant::Pm25,
            ..Default::default()
        };
        let epa = ClassifierConfig {
            table: BreakpointTable::EpaPollutantSpecific,
            ..uniform
        };

        assert_eq!(tally(&input, &uniform).unwrap().get(Category::Good), 1);
        assert_eq!(
            tally(&input, &epa)
                .unwrap()
                .get(Category::UnhealthyForSensitiveGroups),
            1
        );
    }

    #[test]
    fn test_alert_summary_breakdown() {
        let input = readings(&[10.0, 120.0, 130.0, 140.0, 145.0, 170.0, 190.0, 250.0, 400.0]);
        let summary =
            summarize_alerts("s1", window(), &input, &ClassifierConfig::default()).unwrap();

        assert_eq!(summary.total, 8);
        assert_eq!(
            summary.breakdown,
            vec![
                AlertLevelCount {
                    level: Category::UnhealthyForSensitiveGroups,
                    count: 4
                },
                AlertLevelCount {
                    level: Category::Unhealthy,
                    count: 2
                },
                AlertLevelCount {
                    level: Category::VeryUnhealthy,
                    count: 1
                },
                AlertLevelCount {
                    level: Category::Hazardous,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_alert_summary_keeps_zero_levels() {
        let summary =
            summarize_alerts("s1", window(), &readings(&[10.0, 20.0]), &ClassifierConfig::default())
                .unwrap();

        assert_eq!(summary.total, 0);
        assert_eq!(summary.breakdown.len(), 4);
        assert!(summary.breakdown.iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_alert_threshold_is_configurable() {
        let config = ClassifierConfig {
            alert_threshold: Category::VeryUnhealthy,
            ..Default::default()
        };
        let summary =
            summarize_alerts("s1", window(), &readings(&[120.0, 250.0, 400.0]), &config).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.breakdown[0].level, Category::VeryUnhealthy);
    }
}
