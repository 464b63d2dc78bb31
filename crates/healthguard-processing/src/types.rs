use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Which artifact the canonical table is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// The table as ingested.
    #[default]
    Raw,
    /// Output of the cleaning pipeline.
    Cleaned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
}

/// Shape and column layout of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnInfo>,
}

/// The first rows of a table in record orientation.
///
/// Each row maps column name to a JSON value; missing cells and non-finite
/// floats are `null`. Key order follows the table's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub total_rows: usize,
}

/// Result of a successful ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub table: TableInfo,
    pub preview: Preview,
}

// ============================================================================
// Cleaning report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelReplacement {
    pub column: String,
    pub replaced: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imputation {
    pub column: String,
    pub mean: f64,
    pub filled: usize,
}

/// What the cleaning pipeline did to a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CleaningReport {
    /// Number of rows before cleaning.
    pub rows_before: usize,
    /// Number of rows after cleaning.
    pub rows_after: usize,
    /// Rows dropped as exact duplicates of an earlier row.
    pub duplicates_removed: usize,
    /// Text cells whose value changed when surrounding whitespace was stripped.
    pub trimmed_cells: usize,
    /// Zero sentinels replaced with missing, per critical column present.
    pub sentinels: Vec<SentinelReplacement>,
    /// Mean imputations, per numeric column that had missing cells.
    pub imputations: Vec<Imputation>,
    /// Numeric columns with no observed value to impute from.
    pub unfilled_columns: Vec<String>,
    /// Human-readable log of actions, in stage order.
    pub actions: Vec<String>,
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
}

/// Result of a successful clean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningOutcome {
    pub report: CleaningReport,
    pub table: TableInfo,
    pub preview: Preview,
    /// Where the cleaned table was persisted, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted_path: Option<PathBuf>,
}

/// Snapshot of the session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub provenance: Provenance,
    pub has_raw: bool,
    pub has_canonical: bool,
    /// RFC 3339 time of the last successful clean.
    pub cleaned_at: Option<String>,
    pub persisted_path: Option<PathBuf>,
}

// ============================================================================
// Summary statistics
// ============================================================================

/// Shape, types, missing counts and descriptive statistics of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub row_count: usize,
    pub column_count: usize,
    /// Column names in table order.
    pub columns: Vec<String>,
    pub dtypes: BTreeMap<String, String>,
    pub missing: BTreeMap<String, usize>,
    pub statistics: BTreeMap<String, ColumnStatistics>,
}

impl DatasetSummary {
    /// Sum of missing cells over all columns.
    pub fn total_missing(&self) -> usize {
        self.missing.values().sum()
    }
}

/// Descriptive statistics for one column.
///
/// Undefined values (std of fewer than two observations, anything over an
/// empty column) are `None` and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStatistics {
    Numeric {
        count: usize,
        mean: Option<f64>,
        std: Option<f64>,
        min: Option<f64>,
        #[serde(rename = "25%")]
        p25: Option<f64>,
        #[serde(rename = "50%")]
        p50: Option<f64>,
        #[serde(rename = "75%")]
        p75: Option<f64>,
        max: Option<f64>,
    },
    Categorical {
        count: usize,
        unique: usize,
        top: Option<String>,
        freq: Option<usize>,
    },
}

impl ColumnStatistics {
    /// Number of non-missing values.
    pub fn count(&self) -> usize {
        match self {
            Self::Numeric { count, .. } | Self::Categorical { count, .. } => *count,
        }
    }

    /// Mean of a numeric column; `None` for categorical columns.
    pub fn mean(&self) -> Option<f64> {
        match self {
            Self::Numeric { mean, .. } => *mean,
            Self::Categorical { .. } => None,
        }
    }
}
