//! Zero-sentinel substitution for critical measurement columns.
//!
//! A recorded `0` for glucose, blood pressure, BMI, insulin or skin
//! thickness means "not measured". Those zeros become missing so the
//! imputation stage fills them from the observed values.

use polars::prelude::*;
use tracing::debug;

use crate::error::{DatasetError, Result};
use crate::types::SentinelReplacement;
use crate::utils::{get_dtype_category, DtypeCategory};

/// Replace exact zeros with missing in every critical column present in `df`.
///
/// Critical names absent from the table are skipped. A present critical
/// column that is not numeric is a [`DatasetError::Cleaning`] error and
/// `df` is left unchanged.
pub(crate) fn replace_zero_sentinels(
    df: &mut DataFrame,
    critical_columns: &[String],
) -> Result<Vec<SentinelReplacement>> {
    let present: Vec<&String> = critical_columns
        .iter()
        .filter(|name| df.column(name.as_str()).is_ok())
        .collect();

    // Check every column before touching any of them.
    for name in &present {
        let dtype = df.column(name.as_str())?.dtype().clone();
        if get_dtype_category(&dtype) != DtypeCategory::Numeric {
            return Err(DatasetError::cleaning(
                name.as_str(),
                format!("expected a numeric column for zero-sentinel substitution, found {:?}", dtype),
            ));
        }
    }

    let mut replacements = Vec::with_capacity(present.len());

    for name in present {
        let series = df
            .column(name.as_str())?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let values = series.f64()?;

        let mut replaced = 0usize;
        let substituted: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| match v {
                Some(x) if x == 0.0 => {
                    replaced += 1;
                    None
                }
                other => other,
            })
            .collect();

        if replaced > 0 {
            debug!(column = %name, replaced, "zero sentinels replaced with missing");
            df.replace(name, Series::new(name.as_str().into(), substituted))?;
        }

        replacements.push(SentinelReplacement {
            column: name.clone(),
            replaced,
        });
    }

    Ok(replacements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn critical(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_zeros_in_critical_columns_become_missing() {
        let mut df = df![
            "Glucose" => [0i64, 80, 90, 0],
            "Pregnancies" => [0i64, 1, 0, 2],
        ]
        .unwrap();

        let report = replace_zero_sentinels(&mut df, &critical(&["Glucose", "BMI"])).unwrap();

        assert_eq!(report, vec![SentinelReplacement { column: "Glucose".into(), replaced: 2 }]);
        assert_eq!(df.column("Glucose").unwrap().null_count(), 2);
        // Zeros outside the critical set are untouched
        assert_eq!(df.column("Pregnancies").unwrap().null_count(), 0);
        assert_eq!(df.column("Pregnancies").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_column_without_zeros_keeps_dtype() {
        let mut df = df!["BMI" => [25i64, 30]].unwrap();
        let report = replace_zero_sentinels(&mut df, &critical(&["BMI"])).unwrap();
        assert_eq!(report[0].replaced, 0);
        assert_eq!(df.column("BMI").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_near_zero_values_are_kept() {
        let mut df = df!["Insulin" => [0.0, 0.001, -0.5]].unwrap();
        replace_zero_sentinels(&mut df, &critical(&["Insulin"])).unwrap();
        let values: Vec<Option<f64>> = df.column("Insulin").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![None, Some(0.001), Some(-0.5)]);
    }

    #[test]
    fn test_text_critical_column_is_an_error() {
        let mut df = df![
            "Glucose" => [0i64, 100],
            "BMI" => ["thin", "heavy"],
        ]
        .unwrap();
        let before = df.clone();

        let err = replace_zero_sentinels(&mut df, &critical(&["Glucose", "BMI"])).unwrap_err();

        assert_eq!(err.column(), Some("BMI"));
        // Nothing was modified, not even the valid Glucose column
        assert!(df.equals_missing(&before));
    }
}
