//! Data cleaning pipeline for ingested datasets.
//!
//! The pipeline runs four stages in a fixed order:
//! 1. Strip whitespace from text cells
//! 2. Replace zero sentinels in critical columns with missing
//! 3. Impute missing numeric cells with the column mean
//! 4. Remove duplicate rows, keeping the first occurrence
//!
//! Sentinel zeros are excluded from the imputed mean. Duplicates are
//! compared on trimmed, imputed values.
//!
//! The pipeline is a pure function of the input table and the critical
//! column set: the input is never mutated, and running it on its own output
//! changes nothing.

mod sanitizers;
mod sentinels;

use std::time::Instant;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::imputers::StatisticalImputer;
use crate::types::CleaningReport;

/// Stages of the cleaning pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    WhitespaceNormalization,
    SentinelSubstitution,
    NumericImputation,
    DuplicateElimination,
}

impl CleaningStage {
    /// All stages in the order they run.
    pub const ORDER: [CleaningStage; 4] = [
        Self::WhitespaceNormalization,
        Self::SentinelSubstitution,
        Self::NumericImputation,
        Self::DuplicateElimination,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::WhitespaceNormalization => "Normalizing Whitespace",
            Self::SentinelSubstitution => "Replacing Sentinels",
            Self::NumericImputation => "Imputing Values",
            Self::DuplicateElimination => "Removing Duplicates",
        }
    }
}

/// Cleans a raw table into its canonical form.
#[derive(Debug, Clone)]
pub struct CleaningPipeline {
    critical_columns: Vec<String>,
}

impl CleaningPipeline {
    /// Create a pipeline that treats `0` as missing in `critical_columns`.
    pub fn new(critical_columns: Vec<String>) -> Self {
        Self { critical_columns }
    }

    pub fn critical_columns(&self) -> &[String] {
        &self.critical_columns
    }

    /// Run all four stages on a copy of `raw`.
    ///
    /// On failure the error names the offending column and `raw` is
    /// untouched.
    pub fn run(&self, raw: &DataFrame) -> Result<(DataFrame, CleaningReport)> {
        let start = Instant::now();
        let mut df = raw.clone();
        let mut report = CleaningReport {
            rows_before: df.height(),
            ..Default::default()
        };

        info!(rows = df.height(), columns = df.width(), "Starting cleaning pipeline");

        for stage in CleaningStage::ORDER {
            debug!(stage = stage.display_name(), "running stage");
            if let Err(e) = self.run_stage(stage, &mut df, &mut report) {
                warn!(stage = stage.display_name(), error = %e, "cleaning stage failed");
                return Err(e);
            }
        }

        report.rows_after = df.height();
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            rows_before = report.rows_before,
            rows_after = report.rows_after,
            duration_ms = report.duration_ms,
            "Cleaning pipeline complete"
        );

        Ok((df, report))
    }

    fn run_stage(
        &self,
        stage: CleaningStage,
        df: &mut DataFrame,
        report: &mut CleaningReport,
    ) -> Result<()> {
        match stage {
            CleaningStage::WhitespaceNormalization => {
                let trimmed = sanitizers::trim_text_columns(df)?;
                report.trimmed_cells = trimmed;
                if trimmed > 0 {
                    report
                        .actions
                        .push(format!("Trimmed surrounding whitespace from {} cells", trimmed));
                } else {
                    report.actions.push("No text cells needed trimming".to_string());
                }
            }
            CleaningStage::SentinelSubstitution => {
                let replacements = sentinels::replace_zero_sentinels(df, &self.critical_columns)?;
                for r in replacements.iter().filter(|r| r.replaced > 0) {
                    report.actions.push(format!(
                        "Replaced {} zero values in '{}' with missing",
                        r.replaced, r.column
                    ));
                }
                report.sentinels = replacements;
            }
            CleaningStage::NumericImputation => {
                let (imputations, unfilled) = StatisticalImputer::impute_numeric_means(df)?;
                for imp in &imputations {
                    report.actions.push(format!(
                        "Filled {} missing values in '{}' with mean {:.2}",
                        imp.filled, imp.column, imp.mean
                    ));
                }
                for col in &unfilled {
                    report.actions.push(format!(
                        "Left '{}' unfilled: no observed values to average",
                        col
                    ));
                }
                report.imputations = imputations;
                report.unfilled_columns = unfilled;
            }
            CleaningStage::DuplicateElimination => {
                let before = df.height();
                *df = remove_duplicate_rows(df)?;
                let removed = before - df.height();
                report.duplicates_removed = removed;
                if removed > 0 {
                    report
                        .actions
                        .push(format!("Removed {} duplicate rows", removed));
                } else {
                    report.actions.push("No duplicate rows found".to_string());
                }
            }
        }
        Ok(())
    }
}

/// Drop rows that repeat an earlier row across all columns, keeping order.
fn remove_duplicate_rows(df: &DataFrame) -> Result<DataFrame> {
    let unique = df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    Ok(unique)
}
