//! Read-only views of a table: column layout and row previews.

use polars::prelude::*;
use serde_json::{Map, Value};

use crate::types::{ColumnInfo, Preview, TableInfo};
use crate::utils::{any_value_to_json, dtype_label};

/// Shape and per-column type and null count, in column order.
pub fn table_info(df: &DataFrame) -> TableInfo {
    let columns = df
        .get_columns()
        .iter()
        .map(|col| ColumnInfo {
            name: col.name().to_string(),
            dtype: dtype_label(col.dtype()),
            null_count: col.null_count(),
        })
        .collect();

    TableInfo {
        row_count: df.height(),
        column_count: df.width(),
        columns,
    }
}

/// The first `n` rows of `df` in record orientation.
///
/// Asking for more rows than exist returns all of them.
pub fn preview(df: &DataFrame, n: usize) -> Preview {
    let total_rows = df.height();
    let count = n.min(total_rows);
    let sliced = df.slice(0, count);

    let columns: Vec<String> = sliced
        .get_columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();

    let mut rows = Vec::with_capacity(count);
    for row_idx in 0..sliced.height() {
        let mut record = Map::with_capacity(sliced.width());
        for col in sliced.get_columns() {
            let value = col.get(row_idx).ok().map_or(Value::Null, any_value_to_json);
            record.insert(col.name().to_string(), value);
        }
        rows.push(record);
    }

    Preview {
        columns,
        rows,
        total_rows,
    }
}
