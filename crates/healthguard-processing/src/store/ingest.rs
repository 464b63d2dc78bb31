//! CSV ingestion.
//!
//! Turns uploaded bytes into a normalized [`DataFrame`]:
//!
//! 1. Decode as UTF-8 and drop a leading byte-order mark.
//! 2. Validate structure with the `csv` crate (header present, names
//!    unique and non-blank, every record the same width) and re-emit the
//!    records it accepted, which drops blank lines.
//! 3. Read the re-emitted text with Polars, inferring the schema over the whole file and
//!    treating conventional null tokens as missing.
//! 4. Normalize columns: numeric text becomes `Float64`, `NaN` becomes
//!    missing, and text columns mixing numbers with words are rejected.

use std::collections::HashSet;
use std::io::Cursor;

use polars::io::csv::read::NullValues;
use polars::prelude::*;
use tracing::debug;

use crate::error::{DatasetError, Result};
use crate::utils::{is_float_dtype, is_null_token, parse_numeric_cell, to_float_series, NULL_TOKENS};

const BOM: char = '\u{feff}';

/// Parse CSV bytes into a normalized table.
///
/// Fails with [`DatasetError::Parse`] on empty or non UTF-8 input, a
/// missing, blank or duplicated header, rows of unequal width, or a column
/// that mixes numeric and text values.
pub fn parse_csv(bytes: &[u8]) -> Result<DataFrame> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        DatasetError::Parse(format!(
            "input is not valid UTF-8 (invalid byte at offset {})",
            e.valid_up_to()
        ))
    })?;
    let text = text.strip_prefix(BOM).unwrap_or(text);

    if text.trim().is_empty() {
        return Err(DatasetError::Parse("input is empty".to_string()));
    }

    let validated = validate_structure(text)?;
    debug!(records = validated.records, "CSV structure validated");

    let df = read_table(validated.body)?;
    if df.height() != validated.records {
        return Err(DatasetError::Parse(format!(
            "read {} rows but the file has {} records",
            df.height(),
            validated.records
        )));
    }
    normalize_columns(df)
}

/// Records accepted by [`validate_structure`], re-serialized without blank lines.
struct ValidatedCsv {
    records: usize,
    body: Vec<u8>,
}

/// Check header and record widths.
fn validate_structure(text: &str) -> Result<ValidatedCsv> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| DatasetError::Parse(format!("unreadable header: {}", e)))?
        .clone();

    if headers.is_empty() {
        return Err(DatasetError::Parse("missing header row".to_string()));
    }

    let mut seen = HashSet::with_capacity(headers.len());
    for (idx, name) in headers.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(DatasetError::Parse(format!(
                "header of column {} is blank",
                idx + 1
            )));
        }
        if !seen.insert(name) {
            return Err(DatasetError::Parse(format!(
                "duplicate column name '{}'",
                name
            )));
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(text.len()));
    writer.write_record(&headers).map_err(write_error)?;

    let mut records = 0usize;
    for record in reader.byte_records() {
        let record = record.map_err(|e| match e.kind() {
            csv::ErrorKind::UnequalLengths {
                pos,
                expected_len,
                len,
            } => DatasetError::Parse(format!(
                "record on line {} has {} fields, expected {}",
                pos.as_ref().map_or(0, |p| p.line()),
                len,
                expected_len
            )),
            _ => DatasetError::Parse(e.to_string()),
        })?;
        writer.write_byte_record(&record).map_err(write_error)?;
        records += 1;
    }

    let body = writer
        .into_inner()
        .map_err(|e| DatasetError::Parse(format!("cannot buffer records: {}", e.error())))?;
    Ok(ValidatedCsv { records, body })
}

fn write_error(e: csv::Error) -> DatasetError {
    DatasetError::Parse(format!("cannot buffer records: {}", e))
}

fn read_table(body: Vec<u8>) -> Result<DataFrame> {
    let tokens: Vec<PlSmallStr> = NULL_TOKENS
        .iter()
        .filter(|token| !token.is_empty())
        .map(|token| PlSmallStr::from(*token))
        .collect();

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|opts| {
            opts.with_null_values(Some(NullValues::AllColumns(tokens.clone())))
        })
        .into_reader_with_file_handle(Cursor::new(body))
        .finish()
        .map_err(|e| DatasetError::Parse(e.to_string()))
}

/// What a text column turned out to contain.
enum TextColumn {
    Numeric(Vec<Option<f64>>),
    Text,
}

/// Decide whether a text column is really numeric.
///
/// Whitespace-only cells count as missing in a numeric column and are kept
/// verbatim in a text column; a column of nothing but blanks is text.
fn classify_text_column(series: &Series) -> Result<TextColumn> {
    let ca = series.str()?;
    let mut numbers = Vec::with_capacity(ca.len());
    let mut numeric_cells = 0usize;
    let mut blank_cells = 0usize;
    let mut first_text: Option<&str> = None;

    for cell in ca.into_iter() {
        match cell {
            Some(value) if is_null_token(value) => numbers.push(None),
            Some(value) if value.trim().is_empty() => {
                blank_cells += 1;
                numbers.push(None);
            }
            Some(value) => match parse_numeric_cell(value) {
                Some(number) => {
                    numeric_cells += 1;
                    numbers.push(Some(number));
                }
                None => {
                    first_text.get_or_insert(value);
                    numbers.push(None);
                }
            },
            None => numbers.push(None),
        }
    }

    match first_text {
        Some(text) if numeric_cells > 0 => Err(DatasetError::Parse(format!(
            "column '{}' mixes numeric and text values (e.g. '{}')",
            series.name(),
            text
        ))),
        Some(_) => Ok(TextColumn::Text),
        None if numeric_cells == 0 && blank_cells > 0 => Ok(TextColumn::Text),
        None => Ok(TextColumn::Numeric(numbers)),
    }
}

fn normalize_columns(mut df: DataFrame) -> Result<DataFrame> {
    let columns: Vec<(String, DataType)> = df
        .get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.dtype().clone()))
        .collect();

    for (name, dtype) in columns {
        let series = df.column(&name)?.as_materialized_series().clone();
        let has_nan = is_float_dtype(&dtype) && series.is_nan()?.any();

        let replacement = match dtype {
            DataType::String => match classify_text_column(&series)? {
                TextColumn::Numeric(values) => {
                    debug!(column = %name, "text column parsed as numeric");
                    Some(Series::new(name.as_str().into(), values))
                }
                TextColumn::Text => None,
            },
            DataType::Null => Some(Series::new(
                name.as_str().into(),
                vec![None::<f64>; series.len()],
            )),
            _ if has_nan => Some(to_float_series(&series)?),
            _ => None,
        };

        if let Some(new_series) = replacement {
            df.replace(&name, new_series)?;
        }
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dtypes(df: &DataFrame) -> Vec<DataType> {
        df.get_columns().iter().map(|c| c.dtype().clone()).collect()
    }

    #[test]
    fn test_parse_basic_table() {
        let df = parse_csv(b"Glucose,BMI,Name\n0,25.0,  Bob  \n120,0,Ann\n").unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert_eq!(
            dtypes(&df),
            vec![DataType::Int64, DataType::Float64, DataType::String]
        );
        // Whitespace is kept until the cleaning pipeline runs
        let name = df.column("Name").unwrap().str().unwrap().get(0);
        assert_eq!(name, Some("  Bob  "));
    }

    #[test]
    fn test_bom_is_ignored() {
        let df = parse_csv("\u{feff}Age,Score\n30,1\n".as_bytes()).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["Age", "Score"]);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(parse_csv(b""), Err(DatasetError::Parse(_))));
        assert!(matches!(parse_csv(b"  \n\n"), Err(DatasetError::Parse(_))));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = parse_csv(b"a,b\n\xff\xfe,1\n").unwrap_err();
        assert_eq!(err.error_code(), "PARSE_ERROR");
    }

    #[test]
    fn test_unequal_row_width_is_rejected() {
        let err = parse_csv(b"a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, DatasetError::Parse(_)));
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn test_duplicate_header_is_rejected() {
        let err = parse_csv(b"a,a\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate column name 'a'"));
    }

    #[test]
    fn test_blank_header_is_rejected() {
        assert!(matches!(
            parse_csv(b"a,,c\n1,2,3\n"),
            Err(DatasetError::Parse(_))
        ));
    }

    #[test]
    fn test_null_tokens_become_missing() {
        let df = parse_csv(b"Glucose,Name\nNA,Ann\n100,N/A\n,None\n").unwrap();
        assert_eq!(df.column("Glucose").unwrap().null_count(), 2);
        assert_eq!(df.column("Name").unwrap().null_count(), 2);
    }

    #[test]
    fn test_padded_numbers_become_float() {
        let df = parse_csv(b"BMI,Tag\n 25.5 ,x\n30,y\n").unwrap();
        assert_eq!(df.column("BMI").unwrap().dtype(), &DataType::Float64);
        let values: Vec<Option<f64>> = df
            .column("BMI")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(25.5), Some(30.0)]);
    }

    #[test]
    fn test_mixed_column_is_rejected_naming_column() {
        let err = parse_csv(b"Insulin,Name\n80,Ann\nhigh,Bob\n").unwrap_err();
        assert!(matches!(err, DatasetError::Parse(_)));
        assert!(err.to_string().contains("Insulin"));
    }

    #[test]
    fn test_all_missing_column_is_numeric() {
        let df = parse_csv(b"Insulin,Name\n,Ann\nNA,Bob\n").unwrap();
        let insulin = df.column("Insulin").unwrap();
        assert!(crate::utils::is_numeric_dtype(insulin.dtype()));
        assert_eq!(insulin.null_count(), 2);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let df = parse_csv(b"Glucose\n0\n\n80\n90\n\n0\n").unwrap();
        assert_eq!(df.shape(), (4, 1));
        assert_eq!(df.column("Glucose").unwrap().null_count(), 0);
    }

    #[test]
    fn test_quoted_newlines_survive() {
        let df = parse_csv(b"Note,Age\n\"line one\n\nline two\",30\nplain,40\n").unwrap();
        assert_eq!(df.shape(), (2, 2));
        let note = df.column("Note").unwrap().str().unwrap().get(0);
        assert_eq!(note, Some("line one\n\nline two"));
    }

    #[test]
    fn test_whitespace_only_text_cell_is_kept() {
        let df = parse_csv(b"Name,Age\n   ,30\nAnn,40\n").unwrap();
        let name = df.column("Name").unwrap();
        assert_eq!(name.null_count(), 0);
        assert_eq!(name.str().unwrap().get(0), Some("   "));
    }

    #[test]
    fn test_whitespace_only_cell_in_numeric_column_is_missing() {
        let df = parse_csv(b"BMI,Name\n25.5,Ann\n  ,Bob\n").unwrap();
        let bmi = df.column("BMI").unwrap();
        assert_eq!(bmi.dtype(), &DataType::Float64);
        assert_eq!(bmi.null_count(), 1);
    }

    #[test]
    fn test_padded_null_token_is_text() {
        let df = parse_csv(b"Name,Age\n NA ,30\nAnn,40\n").unwrap();
        assert_eq!(df.column("Name").unwrap().null_count(), 0);
    }

    #[test]
    fn test_header_only_input() {
        let df = parse_csv(b"a,b\n").unwrap();
        assert_eq!(df.shape(), (0, 2));
    }
}
