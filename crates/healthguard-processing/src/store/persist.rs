//! On-disk form of the cleaned table.
//!
//! Writes go to a temporary file in the target directory which is then
//! renamed over the target, so readers see either the old file or the
//! complete new one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{DatasetError, Result, ResultExt};
use crate::store::ingest::parse_csv;

/// Serialize a table as comma-separated text with a header row.
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut out = df.clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut out)
        .context("Failed to serialize table as CSV")?;
    Ok(buf)
}

/// Write `df` to `location`, replacing any existing file atomically.
///
/// Missing parent directories are created. Returns the final path.
pub fn persist(df: &DataFrame, location: &Path) -> Result<PathBuf> {
    let dir = match location.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .map_err(|e| DatasetError::Io(e).with_context(format!("Failed to create {}", dir.display())))?;

    let bytes = to_csv_bytes(df)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    debug!(tmp = %tmp.path().display(), bytes = bytes.len(), "wrote temporary artifact");

    tmp.persist(location).map_err(|e| {
        DatasetError::Io(e.error).with_context(format!("Failed to move artifact into {}", location.display()))
    })?;

    info!(path = %location.display(), rows = df.height(), "persisted cleaned table");
    Ok(location.to_path_buf())
}

/// Load a previously persisted table.
pub fn load_persisted(path: &Path) -> Result<DataFrame> {
    let bytes = fs::read(path)
        .map_err(|e| DatasetError::Io(e).with_context(format!("Failed to read {}", path.display())))?;
    parse_csv(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> DataFrame {
        df![
            "Glucose" => [120.0, 85.5],
            "Name" => ["Ann", "Bob"],
        ]
        .unwrap()
    }

    #[test]
    fn test_to_csv_bytes_has_header() {
        let bytes = to_csv_bytes(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Glucose,Name\n"));
        assert!(text.contains("Bob"));
    }

    #[test]
    fn test_persist_creates_directory_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested").join("cleaned.csv");

        let written = persist(&sample(), &target).unwrap();
        assert_eq!(written, target);
        assert!(target.exists());

        let entries: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_persist_overwrites_and_reloads() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("cleaned.csv");

        persist(&df!["a" => [1i64, 2, 3]].unwrap(), &target).unwrap();
        persist(&sample(), &target).unwrap();

        let loaded = load_persisted(&target).unwrap();
        assert_eq!(loaded.shape(), (2, 2));
        assert_eq!(loaded.get_column_names_str(), vec!["Glucose", "Name"]);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_persisted(&dir.path().join("absent.csv")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(!err.is_client_error());
    }
}
