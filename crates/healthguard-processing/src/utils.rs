//! Shared utilities for the dataset session.
//!
//! Helpers used by ingestion, cleaning and statistics so every stage agrees
//! on what counts as numeric, missing or text.

use polars::prelude::*;
use serde_json::{Number, Value};

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for cleaning and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a floating point type.
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

/// Declared type of a column as reported to callers ("Int64", "Float64", "String", ...).
pub fn dtype_label(dtype: &DataType) -> String {
    format!("{:?}", dtype)
}

// =============================================================================
// Cell Parsing Utilities
// =============================================================================

/// Text cells treated as missing when a table is ingested.
pub const NULL_TOKENS: [&str; 11] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "#N/A", "<NA>",
];

/// Check if a raw text cell is a conventional null token.
///
/// Matching is exact, so `"na"` and `" NA "` are text.
pub fn is_null_token(s: &str) -> bool {
    NULL_TOKENS.contains(&s)
}

/// Parse a text cell as a number, ignoring surrounding whitespace.
///
/// Returns `None` for anything `f64` parsing rejects and for non-finite
/// results such as `"inf"`.
pub fn parse_numeric_cell(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Cast a numeric Series to `Float64`, turning NaN into null.
pub fn to_float_series(series: &Series) -> PolarsResult<Series> {
    let cast = series.cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always `Float64`.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let cast = series.cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = cast
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Convert a Polars `AnyValue` into a JSON value.
///
/// Nulls and non-finite floats become `null`; types without a JSON
/// counterpart are rendered with their `Display` form.
pub fn any_value_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),

        AnyValue::Int8(i) => Value::Number(i.into()),
        AnyValue::Int16(i) => Value::Number(i.into()),
        AnyValue::Int32(i) => Value::Number(i.into()),
        AnyValue::Int64(i) => Value::Number(i.into()),
        AnyValue::UInt8(u) => Value::Number(u.into()),
        AnyValue::UInt16(u) => Value::Number(u.into()),
        AnyValue::UInt32(u) => Value::Number(u.into()),
        AnyValue::UInt64(u) => Value::Number(u.into()),

        AnyValue::Float32(f) => Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),

        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),

        _ => Value::String(format!("{}", value)),
    }
}

// =============================================================================
// Tests
// =============================================================================
