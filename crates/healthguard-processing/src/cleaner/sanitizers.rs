//! Whitespace normalization for text columns.

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;

/// Strip leading and trailing whitespace from every cell of every text column.
///
/// Non-text columns are left untouched. Returns the number of cells whose
/// value changed.
pub(crate) fn trim_text_columns(df: &mut DataFrame) -> Result<usize> {
    let column_names: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|col| col.dtype() == &DataType::String)
        .map(|col| col.name().to_string())
        .collect();

    let mut trimmed_cells = 0usize;

    for col_name in &column_names {
        let series = df.column(col_name)?.as_materialized_series();
        let str_series = series.str()?;

        let mut changed = 0usize;
        let mut cleaned_values: Vec<Option<String>> = Vec::with_capacity(str_series.len());
        for opt_val in str_series.into_iter() {
            match opt_val {
                Some(val) => {
                    let cleaned = val.trim();
                    if cleaned.len() != val.len() {
                        changed += 1;
                    }
                    cleaned_values.push(Some(cleaned.to_string()));
                }
                None => cleaned_values.push(None),
            }
        }

        if changed > 0 {
            debug!(column = %col_name, changed, "trimmed whitespace");
            let cleaned_series = Series::new(col_name.as_str().into(), cleaned_values);
            df.replace(col_name, cleaned_series)?;
            trimmed_cells += changed;
        }
    }

    Ok(trimmed_cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_text_columns() {
        let mut df = df![
            "Name" => [Some("  John  "), Some("Ann"), None],
            "Age" => [30i64, 40, 50],
        ]
        .unwrap();

        let changed = trim_text_columns(&mut df).unwrap();

        assert_eq!(changed, 1);
        let names: Vec<Option<&str>> = df.column("Name").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(names, vec![Some("John"), Some("Ann"), None]);
        assert_eq!(df.column("Age").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_trim_is_noop_on_clean_text() {
        let mut df = df!["Name" => ["Ann", "Bob"]].unwrap();
        assert_eq!(trim_text_columns(&mut df).unwrap(), 0);
    }

    #[test]
    fn test_trim_handles_tabs_and_newlines() {
        let mut df = df!["Note" => ["\tfasting\n"]].unwrap();
        trim_text_columns(&mut df).unwrap();
        assert_eq!(df.column("Note").unwrap().str().unwrap().get(0), Some("fasting"));
    }
}
