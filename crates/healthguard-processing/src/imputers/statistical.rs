//! Statistical imputation methods.
//!
//! Missing numeric cells are filled with the arithmetic mean of the
//! column's observed values.

use polars::prelude::*;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::Imputation;
use crate::utils::{fill_numeric_nulls, is_numeric_dtype};

/// Outcome of imputing one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ImputeResult {
    /// No missing cells.
    Complete,
    /// Missing cells were filled with the mean.
    Filled(Imputation),
    /// Every cell is missing, so there is no mean to fill with.
    Unfilled,
}

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill the nulls of every numeric column with that column's mean.
    ///
    /// Filled columns are stored as `Float64`. Entirely missing columns are
    /// left as they are and returned in the second vector.
    pub fn impute_numeric_means(df: &mut DataFrame) -> Result<(Vec<Imputation>, Vec<String>)> {
        let numeric_columns: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect();

        let mut imputations = Vec::new();
        let mut unfilled = Vec::new();

        for col_name in numeric_columns {
            match Self::apply_numeric_mean(df, &col_name)? {
                ImputeResult::Complete => {}
                ImputeResult::Filled(imputation) => imputations.push(imputation),
                ImputeResult::Unfilled => unfilled.push(col_name),
            }
        }

        Ok((imputations, unfilled))
    }

    /// Apply mean imputation to a single numeric column.
    pub fn apply_numeric_mean(df: &mut DataFrame, col_name: &str) -> Result<ImputeResult> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();

        if missing == 0 {
            return Ok(ImputeResult::Complete);
        }

        let Some(mean_val) = series.mean() else {
            warn!(column = %col_name, "column has no observed values; left unfilled");
            return Ok(ImputeResult::Unfilled);
        };

        Self::fill_with_value(df, col_name, mean_val, &series)?;
        debug!(column = %col_name, mean = mean_val, filled = missing, "imputed mean");

        Ok(ImputeResult::Filled(Imputation {
            column: col_name.to_string(),
            mean: mean_val,
            filled: missing,
        }))
    }

    fn fill_with_value(
        df: &mut DataFrame,
        col_name: &str,
        fill_val: f64,
        series: &Series,
    ) -> Result<()> {
        let filled = fill_numeric_nulls(series, fill_val)?;
        df.replace(col_name, filled)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_apply_numeric_mean_basic() {
        let mut df = df!["Glucose" => [None, Some(80.0), Some(90.0), None]].unwrap();

        let result = StatisticalImputer::apply_numeric_mean(&mut df, "Glucose").unwrap();

        assert_eq!(
            result,
            ImputeResult::Filled(Imputation {
                column: "Glucose".into(),
                mean: 85.0,
                filled: 2,
            })
        );
        assert_eq!(
            floats(&df, "Glucose"),
            vec![Some(85.0), Some(80.0), Some(90.0), Some(85.0)]
        );
    }

    #[test]
    fn test_apply_numeric_mean_integer_column_becomes_float() {
        let mut df = df!["Age" => [Some(20i64), None, Some(40)]].unwrap();
        StatisticalImputer::apply_numeric_mean(&mut df, "Age").unwrap();
        assert_eq!(df.column("Age").unwrap().dtype(), &DataType::Float64);
        assert_eq!(floats(&df, "Age"), vec![Some(20.0), Some(30.0), Some(40.0)]);
    }

    #[test]
    fn test_apply_numeric_mean_no_nulls() {
        let mut df = df!["Age" => [20i64, 40]].unwrap();
        let result = StatisticalImputer::apply_numeric_mean(&mut df, "Age").unwrap();
        assert_eq!(result, ImputeResult::Complete);
        assert_eq!(df.column("Age").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_apply_numeric_mean_all_nulls() {
        let mut df = df!["Insulin" => [None::<f64>, None]].unwrap();
        let result = StatisticalImputer::apply_numeric_mean(&mut df, "Insulin").unwrap();
        assert_eq!(result, ImputeResult::Unfilled);
        assert_eq!(df.column("Insulin").unwrap().null_count(), 2);
    }

    #[test]
    fn test_impute_numeric_means_skips_text() {
        let mut df = df![
            "BMI" => [Some(20.0), None],
            "Name" => [Some("Ann"), None],
            "Insulin" => [None::<f64>, None],
        ]
        .unwrap();

        let (imputations, unfilled) = StatisticalImputer::impute_numeric_means(&mut df).unwrap();

        assert_eq!(imputations.len(), 1);
        assert_eq!(imputations[0].column, "BMI");
        assert_eq!(unfilled, vec!["Insulin".to_string()]);
        assert_eq!(df.column("Name").unwrap().null_count(), 1);
    }
}
