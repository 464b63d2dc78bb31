//! HealthGuard dataset cleaning library
//!
//! Cleans clinical CSV datasets with Rust and Polars, then answers
//! questions about the result.
//!
//! # Overview
//!
//! - **Dataset Session**: holds the raw and canonical tables and whether the
//!   canonical one has been cleaned
//! - **Cleaning Pipeline**: whitespace trimming, zero-sentinel substitution
//!   in critical columns, mean imputation and duplicate removal, in that order
//! - **Statistics**: shape, types, missing counts and descriptive statistics
//! - **Queries**: a fixed keyword rule table for row, column, missing-value
//!   and mean questions
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use healthguard_processing::{DatasetSession, SessionConfig};
//!
//! let session = DatasetSession::new(
//!     SessionConfig::builder()
//!         .critical_columns(["Glucose", "BMI"])
//!         .output_dir("output")
//!         .build()?,
//! )?;
//!
//! let uploaded = session.ingest(&std::fs::read("diabetes.csv")?)?;
//! println!("{} rows uploaded", uploaded.table.row_count);
//!
//! let outcome = session.clean()?;
//! for action in &outcome.report.actions {
//!     println!("- {action}");
//! }
//!
//! let summary = session.summarize()?;
//! println!("{}", session.answer("how many rows?")?);
//! let csv = session.export_cleaned()?;
//! ```
//!
//! # Errors
//!
//! Every operation returns [`DatasetResult`], carrying a [`DatasetError`]. Use
//! [`DatasetError::error_code`] and [`DatasetError::is_client_error`] to
//! map errors onto a transport's status classes.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod profiler;
pub mod query;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{CleaningPipeline, CleaningStage};
pub use config::{
    ConfigValidationError, DEFAULT_CRITICAL_COLUMNS, SessionConfig, SessionConfigBuilder,
};
pub use error::{DatasetError, Result as DatasetResult, ResultExt};
pub use imputers::StatisticalImputer;
pub use profiler::summarize;
pub use query::{FALLBACK_ANSWER, QueryTopic, answer};
pub use store::{DatasetSession, parse_csv};
pub use types::{
    CleaningOutcome, CleaningReport, ColumnInfo, ColumnStatistics, DatasetSummary, Imputation,
    IngestReport, Preview, Provenance, SentinelReplacement, SessionStatus, TableInfo,
};
