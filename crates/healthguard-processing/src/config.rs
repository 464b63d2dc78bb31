//! Configuration for a dataset session.
//!
//! This module provides the session options using the builder pattern
//! so front ends can override only what they need.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Physiologic measurements for which a recorded `0` means "not measured".
pub const DEFAULT_CRITICAL_COLUMNS: [&str; 5] =
    ["Glucose", "BloodPressure", "BMI", "Insulin", "SkinThickness"];

/// Configuration for a [`DatasetSession`](crate::DatasetSession).
///
/// Use [`SessionConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use healthguard_processing::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .critical_columns(["Glucose", "BMI"])
///     .output_dir("cleaned")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Columns in which an exact `0` is replaced by missing before imputation.
    /// Names absent from an ingested table are ignored.
    /// Default: Glucose, BloodPressure, BMI, Insulin, SkinThickness
    pub critical_columns: Vec<String>,

    /// Directory the cleaned artifact is persisted into.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// File name of the persisted artifact, without extension.
    /// Default: "cleaned_data"
    pub output_name: String,

    /// Whether a successful clean writes the cleaned table to disk.
    /// When false, the cleaned table lives in memory only.
    /// Default: true
    pub save_to_disk: bool,

    /// Number of rows returned in ingest and clean previews.
    /// Default: 10
    pub preview_rows: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            critical_columns: default_critical_columns(),
            output_dir: PathBuf::from("output"),
            output_name: "cleaned_data".to_string(),
            save_to_disk: true,
            preview_rows: 10,
        }
    }
}

fn default_critical_columns() -> Vec<String> {
    DEFAULT_CRITICAL_COLUMNS
        .iter()
        .map(|name| name.to_string())
        .collect()
}

impl SessionConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Location of the persisted cleaned artifact.
    pub fn persisted_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.output_name))
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let mut seen = HashSet::new();
        for name in &self.critical_columns {
            if name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName);
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigValidationError::DuplicateColumn(name.clone()));
            }
        }

        if self.output_name.trim().is_empty()
            || self.output_name.contains(['/', '\\'])
            || self.output_name == ".."
        {
            return Err(ConfigValidationError::InvalidOutputName(
                self.output_name.clone(),
            ));
        }

        if self.preview_rows == 0 {
            return Err(ConfigValidationError::InvalidPreviewRows(self.preview_rows));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Critical column names must not be blank")]
    EmptyColumnName,

    #[error("Critical column '{0}' is listed more than once")]
    DuplicateColumn(String),

    #[error("Invalid output name '{0}' (must be a non-empty file name without separators)")]
    InvalidOutputName(String),

    #[error("Invalid preview rows: {0} (must be at least 1)")]
    InvalidPreviewRows(usize),
}

/// Builder for [`SessionConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    critical_columns: Option<Vec<String>>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    save_to_disk: Option<bool>,
    preview_rows: Option<usize>,
}

impl SessionConfigBuilder {
    /// Replace the critical column set.
    pub fn critical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.critical_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the directory the cleaned artifact is written to.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the artifact file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable persisting the cleaned table.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Set how many rows previews return.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `SessionConfig` or an error if validation fails.
    pub fn build(self) -> Result<SessionConfig, ConfigValidationError> {
        let config = SessionConfig {
            critical_columns: self
                .critical_columns
                .unwrap_or_else(default_critical_columns),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("output")),
            output_name: self
                .output_name
                .unwrap_or_else(|| "cleaned_data".to_string()),
            save_to_disk: self.save_to_disk.unwrap_or(true),
            preview_rows: self.preview_rows.unwrap_or(10),
        };

        config.validate()?;
        Ok(config)
    }
}
