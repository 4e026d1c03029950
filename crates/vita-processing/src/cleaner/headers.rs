//! Header sanitization.
//!
//! Source datasets carry headers like `"Life expectancy "` or
//! `"Adult\u{a0}Mortality"`: non-breaking spaces, double spaces, stray
//! padding. Every header is normalized before any other stage looks at it.

use anyhow::Result;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));

/// Normalize a single header: non-breaking spaces to ASCII space, whitespace
/// runs collapsed to one space, leading/trailing whitespace stripped.
pub fn normalize_header(raw: &str) -> String {
    let replaced = raw.replace('\u{a0}', " ");
    WHITESPACE_RUN.replace_all(&replaced, " ").trim().to_string()
}

/// Rebuild the frame with normalized headers, dropping later duplicates.
///
/// Returns the new frame, the headers that were renamed, and the number of
/// duplicate columns dropped (first occurrence wins).
pub(crate) fn normalize_headers(df: &DataFrame) -> Result<(DataFrame, Vec<String>, usize)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    let mut renamed = Vec::new();
    let mut dropped = 0usize;

    for col in df.get_columns() {
        let raw = col.name().to_string();
        let normalized = normalize_header(&raw);

        if !seen.insert(normalized.clone()) {
            debug!("Dropping duplicate column '{}'", normalized);
            dropped += 1;
            continue;
        }

        let mut series = col.as_materialized_series().clone();
        if normalized != raw {
            renamed.push(normalized.clone());
            series.rename(normalized.into());
        }
        columns.push(series.into());
    }

    Ok((DataFrame::new(columns)?, renamed, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header_nbsp() {
        assert_eq!(normalize_header("Life\u{a0}expectancy"), "Life expectancy");
    }

    #[test]
    fn test_normalize_header_whitespace_runs() {
        assert_eq!(normalize_header("  under-five   deaths "), "under-five deaths");
        assert_eq!(normalize_header("GDP\t per capita"), "GDP per capita");
    }

    #[test]
    fn test_normalize_header_already_clean() {
        assert_eq!(normalize_header("Schooling"), "Schooling");
    }

    #[test]
    fn test_normalize_headers_renames_and_dedups() {
        let df = DataFrame::new(vec![
            Series::new("Life expectancy ".into(), &[65.0, 70.0]).into(),
            Series::new("Life\u{a0}expectancy".into(), &[1.0, 2.0]).into(),
            Series::new("Year".into(), &[2000i64, 2001]).into(),
        ])
        .unwrap();

        let (out, renamed, dropped) = normalize_headers(&df).unwrap();

        assert_eq!(out.width(), 2);
        assert_eq!(dropped, 1);
        assert_eq!(renamed, vec!["Life expectancy".to_string()]);

        // First occurrence wins
        let life = out.column("Life expectancy").unwrap();
        assert_eq!(life.get(0).unwrap().try_extract::<f64>().unwrap(), 65.0);
    }

    #[test]
    fn test_normalize_headers_no_nbsp_remains() {
        let df = DataFrame::new(vec![
            Series::new("Adult\u{a0}\u{a0}Mortality".into(), &[100.0]).into(),
        ])
        .unwrap();

        let (out, _, _) = normalize_headers(&df).unwrap();
        for name in out.get_column_names() {
            assert!(!name.contains('\u{a0}'));
        }
        assert!(out.column("Adult Mortality").is_ok());
    }
}
