//! Descriptive statistics for single columns.

use std::cmp::Reverse;
use std::collections::HashMap;

use polars::prelude::*;

use crate::error::Result;
use crate::types::ColumnStatistics;

/// count/mean/std/min/quartiles/max over the non-missing values of a numeric column.
///
/// `std` is the sample standard deviation (n-1) and is `None` with fewer
/// than two values. Every statistic except `count` is `None` for an empty
/// column.
pub(crate) fn numeric_statistics(series: &Series) -> Result<ColumnStatistics> {
    let casted = series.cast(&DataType::Float64)?;
    let values: Vec<f64> = casted
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect();

    let n = values.len();
    if n == 0 {
        return Ok(ColumnStatistics::Numeric {
            count: 0,
            mean: None,
            std: None,
            min: None,
            p25: None,
            p50: None,
            p75: None,
            max: None,
        });
    }

    let mut sorted = values.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = values.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
        variance.sqrt()
    });

    Ok(ColumnStatistics::Numeric {
        count: n,
        mean: Some(mean),
        std,
        min: sorted.first().copied(),
        p25: quantile_sorted(&sorted, 0.25),
        p50: quantile_sorted(&sorted, 0.5),
        p75: quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied(),
    })
}

/// count/unique/top/freq over the non-missing values of a text or boolean column.
///
/// When several values share the highest frequency, the one appearing
/// first in the column wins.
pub(crate) fn categorical_statistics(series: &Series) -> Result<ColumnStatistics> {
    let as_text = series.cast(&DataType::String)?;
    let ca = as_text.str()?;

    // value -> (frequency, first position)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut count = 0usize;
    for (idx, value) in ca.into_iter().enumerate() {
        if let Some(v) = value {
            count += 1;
            counts.entry(v).or_insert((0, idx)).0 += 1;
        }
    }

    let top = counts
        .iter()
        .max_by_key(|(_, (freq, first))| (*freq, Reverse(*first)))
        .map(|(value, (freq, _))| (value.to_string(), *freq));

    Ok(ColumnStatistics::Categorical {
        count,
        unique: counts.len(),
        top: top.as_ref().map(|(value, _)| value.clone()),
        freq: top.map(|(_, freq)| freq),
    })
}

/// Quantile of pre-sorted values with linear interpolation between the
/// closest ranks.
pub(crate) fn quantile_sorted(values: &[f64], quantile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let pos = quantile.clamp(0.0, 1.0) * (values.len() as f64 - 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(values[lower]);
    }
    let weight = pos - lower as f64;
    Some(values[lower] + (values[upper] - values[lower]) * weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_sorted_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&values, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&values, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&values, 0.75), Some(3.25));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_numeric_statistics() {
        let series = Series::new("Glucose".into(), &[Some(85.0), Some(80.0), None, Some(90.0), Some(85.0)]);
        let stats = numeric_statistics(&series).unwrap();

        let ColumnStatistics::Numeric { count, mean, std, min, p50, max, .. } = stats else {
            panic!("expected numeric statistics");
        };
        assert_eq!(count, 4);
        assert_eq!(mean, Some(85.0));
        // sample std of [80, 85, 85, 90]
        let expected = (50.0f64 / 3.0).sqrt();
        assert!((std.unwrap() - expected).abs() < 1e-12);
        assert_eq!(min, Some(80.0));
        assert_eq!(p50, Some(85.0));
        assert_eq!(max, Some(90.0));
    }

    #[test]
    fn test_numeric_statistics_single_value_has_no_std() {
        let series = Series::new("x".into(), &[7i64]);
        let stats = numeric_statistics(&series).unwrap();
        assert!(matches!(stats, ColumnStatistics::Numeric { count: 1, std: None, .. }));
    }

    #[test]
    fn test_numeric_statistics_empty_column() {
        let series = Series::new("x".into(), &[None::<f64>, None]);
        let stats = numeric_statistics(&series).unwrap();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.mean(), None);
    }

    #[test]
    fn test_categorical_statistics_tie_breaks_by_first_appearance() {
        let series = Series::new("Name".into(), &[Some("Bob"), Some("Ann"), None, Some("Ann"), Some("Bob")]);
        let stats = categorical_statistics(&series).unwrap();
        assert_eq!(
            stats,
            ColumnStatistics::Categorical {
                count: 4,
                unique: 2,
                top: Some("Bob".to_string()),
                freq: Some(2),
            }
        );
    }

    #[test]
    fn test_categorical_statistics_boolean() {
        let series = Series::new("Smoker".into(), &[true, false, false]);
        let stats = categorical_statistics(&series).unwrap();
        assert_eq!(
            stats,
            ColumnStatistics::Categorical {
                count: 3,
                unique: 2,
                top: Some("false".to_string()),
                freq: Some(2),
            }
        );
    }

    #[test]
    fn test_categorical_statistics_empty_column() {
        let series = Series::new("Name".into(), &[None::<&str>]);
        let stats = categorical_statistics(&series).unwrap();
        assert_eq!(
            stats,
            ColumnStatistics::Categorical { count: 0, unique: 0, top: None, freq: None }
        );
    }
}
