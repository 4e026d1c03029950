//! CSV export of a filtered selection.
//!
//! The export round-trips: loading the exported file and re-running the
//! cleaner yields the original selection. Derived index columns are not
//! exported: they are recomputed, never persisted.

use crate::error::{PrepError, Result};
use crate::kpi::DERIVED_COLUMNS;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Drop the derived index columns, keeping everything else in order.
pub fn strip_derived_columns(df: &DataFrame) -> Result<DataFrame> {
    let keep: Vec<PlSmallStr> = df
        .get_column_names()
        .into_iter()
        .filter(|name| !DERIVED_COLUMNS.contains(&name.as_str()))
        .cloned()
        .collect();

    Ok(df.select(keep)?)
}

/// Write the filtered selection as UTF-8 CSV: header row, comma separator,
/// no index column, derived columns stripped.
pub fn export_filtered(df: &DataFrame, path: &Path) -> Result<PathBuf> {
    let mut out = strip_derived_columns(df)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path).map_err(|e| {
        PrepError::ExportFailed(format!("cannot create {}: {}", path.display(), e))
    })?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut out)
        .map_err(|e| PrepError::ExportFailed(e.to_string()))?;

    info!("Selection exported: {} ({} rows)", path.display(), out.height());

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::HEALTH_INDEX;

    fn frame_with_derived() -> DataFrame {
        DataFrame::new(vec![
            Series::new("Country".into(), &["A", "B"]).into(),
            Series::new("Year".into(), &[2000i64, 2001]).into(),
            Series::new(HEALTH_INDEX.into(), &[0.2, 0.8]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_strip_derived_columns() {
        let df = frame_with_derived();
        let out = strip_derived_columns(&df).unwrap();

        assert_eq!(out.width(), 2);
        assert!(out.column(HEALTH_INDEX).is_err());
        assert_eq!(
            out.get_column_names()
                .into_iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>(),
            vec!["Country".to_string(), "Year".to_string()]
        );
    }

    #[test]
    fn test_strip_derived_noop_without_derived() {
        let df = df!["Country" => ["A"], "Year" => [2000i64]].unwrap();
        let out = strip_derived_columns(&df).unwrap();
        assert_eq!(out.width(), 2);
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let df = frame_with_derived();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filtered.csv");

        export_filtered(&df, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "Country,Year");
        assert_eq!(lines.next().unwrap(), "A,2000");
        assert_eq!(lines.next().unwrap(), "B,2001");
    }

    #[test]
    fn test_export_empty_selection() {
        let df = frame_with_derived().head(Some(0));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        export_filtered(&df, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Country,Year"));
    }

    #[test]
    fn test_export_creates_parent_dirs() {
        let df = frame_with_derived();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/out.csv");

        export_filtered(&df, &path).unwrap();
        assert!(path.exists());
    }
}
