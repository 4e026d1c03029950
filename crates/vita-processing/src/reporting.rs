//! JSON report generation.
//!
//! Builds a serializable report of one preparation pass (summary, resolved
//! registry, per-index value ranges) and writes it next to the exports.

use crate::error::{PrepError, Result};
use crate::types::{PrepResult, PrepSummary};
use chrono::Utc;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Observed value range of a derived column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexRange {
    pub min: f64,
    pub max: f64,
}

/// Full report of one preparation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepReport {
    /// Source file the table was loaded from.
    pub input_file: String,
    /// RFC 3339 timestamp of report generation.
    pub generated_at: String,
    /// Summary of the pass.
    pub summary: PrepSummary,
    /// Cleaning action strings.
    pub cleaning_actions: Vec<String>,
    /// Derivation step strings.
    pub derivation_steps: Vec<String>,
    /// Derived column -> observed [min, max] over the prepared table.
    pub index_ranges: BTreeMap<String, IndexRange>,
}

/// Builds and writes preparation reports.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Build the report for a finished pass.
    pub fn build_report(input_file: &str, result: &PrepResult) -> PrepReport {
        PrepReport {
            input_file: input_file.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            summary: result.summary.clone(),
            cleaning_actions: result.cleaning_actions.clone(),
            derivation_steps: result.derivation_steps.clone(),
            index_ranges: Self::index_ranges(&result.table, &result.summary.derived_columns),
        }
    }

    /// Write the report as pretty JSON; returns the written path.
    pub fn write_report_to_file(
        report: &PrepReport,
        output_dir: &Path,
        stem: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("{}_report.json", stem));

        let json = serde_json::to_string_pretty(report)
            .map_err(|e| PrepError::ReportGenerationFailed(e.to_string()))?;
        fs::write(&path, json)?;

        info!("Report written: {}", path.display());
        Ok(path)
    }

    fn index_ranges(df: &DataFrame, derived: &[String]) -> BTreeMap<String, IndexRange> {
        let mut ranges = BTreeMap::new();

        for name in derived {
            let Ok(col) = df.column(name) else { continue };
            let Ok(ca) = col.as_materialized_series().f64().map(|ca| ca.clone()) else {
                continue;
            };

            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for v in ca.into_iter().flatten() {
                min = min.min(v);
                max = max.max(v);
            }

            if min.is_finite() && max.is_finite() {
                ranges.insert(name.clone(), IndexRange { min, max });
            }
        }

        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;

    fn prepared_result() -> PrepResult {
        let df = DataFrame::new(vec![
            Series::new("Country".into(), &["A", "B", "C"]).into(),
            Series::new("Year".into(), &[2014i64, 2015, 2016]).into(),
            Series::new("Life expectancy".into(), &[59.9, 65.0, 70.1]).into(),
            Series::new("Adult Mortality".into(), &[271.0, 263.0, 150.0]).into(),
            Series::new("infant deaths".into(), &[64.0, 62.0, 30.0]).into(),
            Series::new("under-five deaths".into(), &[86.0, 83.0, 40.0]).into(),
            Series::new("BMI".into(), &[18.6, 19.1, 22.0]).into(),
            Series::new("GDP".into(), &[612.69, 584.26, 1200.0]).into(),
            Series::new("Income composition of resources".into(), &[0.476, 0.479, 0.6]).into(),
            Series::new("Schooling".into(), &[10.0, 10.1, 12.0]).into(),
        ])
        .unwrap();

        Pipeline::builder().build().unwrap().process(df).unwrap()
    }

    #[test]
    fn test_build_report_ranges_in_unit_interval() {
        let result = prepared_result();
        let report = ReportGenerator::build_report("life.csv", &result);

        assert_eq!(report.input_file, "life.csv");
        assert_eq!(report.index_ranges.len(), 3);
        for range in report.index_ranges.values() {
            assert!(range.min >= 0.0);
            assert!(range.max <= 1.0);
            assert!(range.min <= range.max);
        }
    }

    #[test]
    fn test_write_report_roundtrip() {
        let result = prepared_result();
        let report = ReportGenerator::build_report("life.csv", &result);

        let dir = tempfile::tempdir().unwrap();
        let path = ReportGenerator::write_report_to_file(&report, dir.path(), "life").unwrap();

        assert!(path.ends_with("life_report.json"));
        let content = fs::read_to_string(&path).unwrap();
        let back: PrepReport = serde_json::from_str(&content).unwrap();
        assert_eq!(back.summary.rows, 3);
        assert_eq!(back.index_ranges.len(), 3);
    }
}
