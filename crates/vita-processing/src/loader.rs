//! CSV loading with fallback strategies, plus the optional in-process table
//! cache.
//!
//! The source file is read fresh on every page render; the cache only exists
//! for deployments where the file is known to never change within a process.

use crate::error::{PrepError, Result};
use crate::types::PrepResult;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

/// Load a delimited table with a header row.
///
/// Tries progressively more forgiving strategies, the last one pre-cleaning
/// the raw content in memory. A missing or unreadable file is fatal; no
/// partial table is ever returned.
pub fn read_table(path: &Path, infer_rows: usize) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(PrepError::InputNotFound(path.to_path_buf()));
    }

    // Strategy 1: standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(infer_rows))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: without quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(infer_rows))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(None))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Loading without quotes failed: {}", e);
        }
    }

    // Strategy 3: pre-clean content
    match fs::read_to_string(path) {
        Ok(content) => {
            let cleaned = clean_csv_content(&content);
            let cursor = Cursor::new(cleaned);

            CsvReadOptions::default()
                .with_infer_schema_length(Some(infer_rows))
                .with_has_header(true)
                .into_reader_with_file_handle(cursor)
                .finish()
                .map_err(|e| e.into())
        }
        Err(e) => {
            error!("Could not read file: {}", e);
            Err(e.into())
        }
    }
}

/// Strip doubled quotes and blank lines from raw CSV content.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Memoized prepared tables keyed on the canonical source path.
///
/// The cached table is read-only after insertion; a single `Mutex` guards
/// the map itself, which is the only shared mutable state in the crate.
#[derive(Debug, Default)]
pub struct TableCache {
    inner: Mutex<HashMap<PathBuf, Arc<PrepResult>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// The cached result for a path, if present.
    pub fn get(&self, path: &Path) -> Option<Arc<PrepResult>> {
        let key = Self::key(path);
        self.inner
            .lock()
            .expect("table cache poisoned")
            .get(&key)
            .cloned()
    }

    /// Insert a prepared result, returning the shared handle.
    pub fn insert(&self, path: &Path, result: PrepResult) -> Arc<PrepResult> {
        let key = Self::key(path);
        let shared = Arc::new(result);
        self.inner
            .lock()
            .expect("table cache poisoned")
            .insert(key, shared.clone());
        shared
    }
}
