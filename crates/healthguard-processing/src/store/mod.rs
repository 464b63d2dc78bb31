//! Dataset session state.
//!
//! A [`DatasetSession`] owns the most recently ingested raw table, the
//! canonical table and its provenance. Everything lives behind one
//! `parking_lot::RwLock`:
//!
//! - `ingest` and `clean` hold the write lock for their whole run, so they
//!   serialize and a reader sees either the pre-clean or the complete
//!   post-clean state, never a mix.
//! - `preview`, `summarize`, `answer` and `export_cleaned` take the read lock.
//!
//! Operations either succeed or leave the state exactly as it was.

mod ingest;
mod persist;
mod view;

pub use ingest::parse_csv;
pub use persist::{load_persisted, persist, to_csv_bytes};
pub use view::{preview, table_info};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use polars::prelude::DataFrame;
use tracing::{debug, info};

use crate::cleaner::CleaningPipeline;
use crate::config::SessionConfig;
use crate::error::{DatasetError, Result};
use crate::profiler;
use crate::query;
use crate::types::{
    CleaningOutcome, DatasetSummary, IngestReport, Preview, Provenance, SessionStatus, TableInfo,
};

#[derive(Default)]
struct SessionState {
    raw: Option<DataFrame>,
    canonical: Option<DataFrame>,
    provenance: Provenance,
    cleaned_at: Option<DateTime<Utc>>,
    persisted_path: Option<PathBuf>,
}

impl SessionState {
    /// Start over from a freshly ingested table.
    ///
    /// A previously persisted file stays on disk but is no longer canonical.
    fn reset_to_raw(&mut self, df: DataFrame) {
        self.canonical = Some(df.clone());
        self.raw = Some(df);
        self.provenance = Provenance::Raw;
        self.cleaned_at = None;
        self.persisted_path = None;
    }

    /// Start from a table that was cleaned and persisted by an earlier session.
    ///
    /// Plays the role of ingestion for [`DatasetSession::resume`].
    fn restore_cleaned(
        &mut self,
        df: DataFrame,
        cleaned_at: Option<DateTime<Utc>>,
        persisted_path: PathBuf,
    ) {
        self.raw = Some(df.clone());
        self.canonical = Some(df);
        self.provenance = Provenance::Cleaned;
        self.cleaned_at = cleaned_at;
        self.persisted_path = Some(persisted_path);
    }

    /// Sole mutator of the canonical table once it has been ingested or restored.
    fn replace_canonical(&mut self, cleaned: DataFrame, persisted_path: Option<PathBuf>) {
        self.canonical = Some(cleaned);
        self.provenance = Provenance::Cleaned;
        self.cleaned_at = Some(Utc::now());
        self.persisted_path = persisted_path;
    }

    fn canonical(&self) -> Result<&DataFrame> {
        self.canonical
            .as_ref()
            .ok_or_else(|| DatasetError::NotReady("no dataset has been uploaded".to_string()))
    }

    fn cleaned(&self) -> Result<&DataFrame> {
        match (&self.canonical, self.provenance) {
            (Some(df), Provenance::Cleaned) => Ok(df),
            (None, _) => Err(DatasetError::NotReady(
                "no dataset has been uploaded".to_string(),
            )),
            (Some(_), Provenance::Raw) => Err(DatasetError::NotReady(
                "the dataset has not been cleaned yet".to_string(),
            )),
        }
    }
}

/// The process-wide dataset session.
pub struct DatasetSession {
    config: SessionConfig,
    pipeline: CleaningPipeline,
    state: RwLock<SessionState>,
}

static_assertions::assert_impl_all!(DatasetSession: Send, Sync);

impl Default for DatasetSession {
    fn default() -> Self {
        Self::from_valid_config(SessionConfig::default())
    }
}

impl DatasetSession {
    /// Create an empty session.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| DatasetError::InvalidConfig(e.to_string()))?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: SessionConfig) -> Self {
        Self {
            pipeline: CleaningPipeline::new(config.critical_columns.clone()),
            config,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Recreate a session from the cleaned artifact persisted under `config`.
    ///
    /// The loaded table becomes both raw and canonical with provenance
    /// `cleaned`; cleaning it again is a no-op. Fails with
    /// [`DatasetError::NotReady`] if nothing was persisted there.
    pub fn resume(config: SessionConfig) -> Result<Self> {
        let session = Self::new(config)?;
        let path = session.config.persisted_path();
        if !path.is_file() {
            return Err(DatasetError::NotReady(format!(
                "no persisted dataset at {}",
                path.display()
            )));
        }

        let df = load_persisted(&path)?;
        let cleaned_at = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .ok();

        info!(path = %path.display(), rows = df.height(), "resumed session from persisted dataset");

        session.state.write().restore_cleaned(df, cleaned_at, path);
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Parse CSV bytes and make the result the raw and canonical table.
    ///
    /// Resets provenance to raw. On failure the session is unchanged.
    pub fn ingest(&self, bytes: &[u8]) -> Result<IngestReport> {
        let mut state = self.state.write();

        let df = parse_csv(bytes)?;
        let report = IngestReport {
            table: table_info(&df),
            preview: preview(&df, self.config.preview_rows),
        };

        if state.provenance == Provenance::Cleaned {
            debug!("previous cleaned dataset is no longer canonical");
        }
        state.reset_to_raw(df);

        info!(
            rows = report.table.row_count,
            columns = report.table.column_count,
            "ingested dataset"
        );
        Ok(report)
    }

    /// Read a CSV file and [`ingest`](Self::ingest) its contents.
    pub fn ingest_file(&self, path: impl AsRef<Path>) -> Result<IngestReport> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            DatasetError::Io(e).with_context(format!("Failed to read {}", path.display()))
        })?;
        self.ingest(&bytes)
    }

    /// Run the cleaning pipeline on the raw table and make the output canonical.
    ///
    /// Always starts from the raw table, so repeated calls give the same
    /// result. When `save_to_disk` is set the cleaned table is persisted
    /// before the swap; if persisting fails the session is unchanged.
    pub fn clean(&self) -> Result<CleaningOutcome> {
        let mut state = self.state.write();

        let raw = state
            .raw
            .as_ref()
            .ok_or_else(|| DatasetError::NotReady("no dataset has been uploaded".to_string()))?;

        let (cleaned, report) = self.pipeline.run(raw)?;

        let persisted_path = if self.config.save_to_disk {
            Some(persist(&cleaned, &self.config.persisted_path())?)
        } else {
            None
        };

        let outcome = CleaningOutcome {
            report,
            table: table_info(&cleaned),
            preview: preview(&cleaned, self.config.preview_rows),
            persisted_path: persisted_path.clone(),
        };

        state.replace_canonical(cleaned, persisted_path);
        info!(rows = outcome.table.row_count, "canonical dataset replaced by cleaned table");

        Ok(outcome)
    }

    /// The canonical table: raw until cleaned, cleaned afterwards.
    pub fn canonical(&self) -> Result<DataFrame> {
        self.state.read().canonical().cloned()
    }

    /// The most recently ingested table, as parsed.
    pub fn raw(&self) -> Result<DataFrame> {
        self.state
            .read()
            .raw
            .clone()
            .ok_or_else(|| DatasetError::NotReady("no dataset has been uploaded".to_string()))
    }

    /// Layout of the canonical table.
    pub fn table_info(&self) -> Result<TableInfo> {
        Ok(table_info(self.state.read().canonical()?))
    }

    /// First `n` rows of the canonical table.
    pub fn preview(&self, n: usize) -> Result<Preview> {
        Ok(preview(self.state.read().canonical()?, n))
    }

    /// Statistics of the cleaned table.
    pub fn summarize(&self) -> Result<DatasetSummary> {
        profiler::summarize(self.state.read().cleaned()?)
    }

    /// Answer a keyword question about the cleaned table.
    pub fn answer(&self, question: &str) -> Result<String> {
        Ok(query::answer(self.state.read().cleaned()?, question))
    }

    /// The cleaned table as CSV bytes.
    pub fn export_cleaned(&self) -> Result<Vec<u8>> {
        let state = self.state.read();
        let df = state
            .cleaned()
            .map_err(|_| DatasetError::Export("no cleaned dataset to export".to_string()))?;
        to_csv_bytes(df)
    }

    /// Write the cleaned table to `location`, atomically.
    pub fn export_to(&self, location: impl AsRef<Path>) -> Result<PathBuf> {
        let state = self.state.read();
        let df = state
            .cleaned()
            .map_err(|_| DatasetError::Export("no cleaned dataset to export".to_string()))?;
        persist(df, location.as_ref())
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.state.read();
        SessionStatus {
            provenance: state.provenance,
            has_raw: state.raw.is_some(),
            has_canonical: state.canonical.is_some(),
            cleaned_at: state.cleaned_at.map(|t| t.to_rfc3339()),
            persisted_path: state.persisted_path.clone(),
        }
    }
}
