//! Statistics engine.
//!
//! Computes shape, declared types, missing-cell counts and descriptive
//! statistics of a table. Side-effect free.

mod statistics;

use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::types::DatasetSummary;
use crate::utils::{dtype_label, is_numeric_dtype};

/// Summarize `df`.
///
/// Numeric columns get count/mean/std/min/quartiles/max; every other
/// column gets count/unique/top/freq.
pub fn summarize(df: &DataFrame) -> Result<DatasetSummary> {
    let mut columns = Vec::with_capacity(df.width());
    let mut dtypes = BTreeMap::new();
    let mut missing = BTreeMap::new();
    let mut stats = BTreeMap::new();

    for col in df.get_columns() {
        let name = col.name().to_string();
        let series = col.as_materialized_series();

        let column_stats = if is_numeric_dtype(series.dtype()) {
            statistics::numeric_statistics(series)?
        } else {
            statistics::categorical_statistics(series)?
        };

        dtypes.insert(name.clone(), dtype_label(series.dtype()));
        missing.insert(name.clone(), series.null_count());
        stats.insert(name.clone(), column_stats);
        columns.push(name);
    }

    debug!(rows = df.height(), columns = df.width(), "summarized table");

    Ok(DatasetSummary {
        row_count: df.height(),
        column_count: df.width(),
        columns,
        dtypes,
        missing,
        statistics: stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnStatistics;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summarize_shape_types_and_missing() {
        let df = df![
            "Glucose" => [Some(120.0), None, Some(100.0)],
            "Name" => [Some("Ann"), Some("Bob"), None],
            "Age" => [30i64, 40, 50],
        ]
        .unwrap();

        let summary = summarize(&df).unwrap();

        assert_eq!(summary.row_count, 3);
        assert_eq!(summary.column_count, 3);
        assert_eq!(summary.columns, vec!["Glucose", "Name", "Age"]);
        assert_eq!(summary.dtypes["Glucose"], "Float64");
        assert_eq!(summary.dtypes["Name"], "String");
        assert_eq!(summary.dtypes["Age"], "Int64");
        assert_eq!(summary.missing["Glucose"], 1);
        assert_eq!(summary.total_missing(), 2);
        assert_eq!(summary.statistics["Age"].mean(), Some(40.0));
        assert!(matches!(
            summary.statistics["Name"],
            ColumnStatistics::Categorical { count: 2, unique: 2, .. }
        ));
    }

    #[test]
    fn test_summarize_empty_table() {
        let df = df!["a" => Vec::<f64>::new()].unwrap();
        let summary = summarize(&df).unwrap();
        assert_eq!(summary.row_count, 0);
        assert_eq!(summary.statistics["a"].count(), 0);
    }
}
