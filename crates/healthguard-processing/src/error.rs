//! Error types for the dataset session.
//!
//! Every core operation returns a [`Result`] carrying one [`DatasetError`]
//! kind. Errors are serializable as `{ code, message }` so a transport layer
//! can hand them to a client without exposing internal state, and
//! [`DatasetError::is_client_error`] tells that layer which status class to
//! answer with.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The error type for ingestion, cleaning, statistics and export.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Input could not be parsed into a table.
    #[error("Failed to parse CSV: {0}")]
    Parse(String),

    /// The operation needs a table that does not exist yet.
    #[error("Dataset not ready: {0}")]
    NotReady(String),

    /// A cleaning stage met a column that violates its type expectation.
    #[error("Cleaning failed on column '{column}': {reason}")]
    Cleaning { column: String, reason: String },

    /// There is no cleaned artifact to serialize or persist.
    #[error("Export failed: {0}")]
    Export(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DatasetError>,
    },
}

impl DatasetError {
    /// Build a cleaning error for `column`.
    pub fn cleaning(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Cleaning {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DatasetError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code for this error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "PARSE_ERROR",
            Self::NotReady(_) => "NOT_READY",
            Self::Cleaning { .. } => "CLEANING_ERROR",
            Self::Export(_) => "EXPORT_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the caller is at fault (client-error class) rather than the
    /// service (server-error class).
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Parse(_)
            | Self::NotReady(_)
            | Self::Cleaning { .. }
            | Self::Export(_)
            | Self::InvalidConfig(_) => true,
            Self::Io(_) | Self::Polars(_) | Self::Json(_) => false,
            Self::WithContext { source, .. } => source.is_client_error(),
        }
    }

    /// The offending column of a cleaning error, looking through context.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Cleaning { column, .. } => Some(column),
            Self::WithContext { source, .. } => source.column(),
            _ => None,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for DatasetError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DatasetError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DatasetError::Polars(e).with_context(context))
    }
}
