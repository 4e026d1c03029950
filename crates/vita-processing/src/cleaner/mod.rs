//! Table cleaning for the preparation pipeline.
//!
//! This module provides functionality for:
//! - Header normalization and duplicate-header removal
//! - Numeric coercion of string columns
//! - Infinity replacement
//! - Median/mean imputation of missing numeric values

mod coercion;
mod headers;

pub use headers::normalize_header;

use crate::config::{NumericImputation, PipelineConfig};
use crate::imputers::StatisticalImputer;
use crate::utils::is_numeric_dtype;
use anyhow::Result;
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Result of a cleaning pass: the cleaned frame plus the bookkeeping the
/// summary and report surface to users.
#[derive(Debug)]
pub struct CleanOutcome {
    pub df: DataFrame,
    pub actions: Vec<String>,
    pub duplicate_headers_dropped: usize,
    pub coerced_columns: Vec<String>,
    pub infinities_replaced: usize,
    pub imputed_cells: usize,
}

/// Table cleaner applying the fixed cleaning sequence every page load runs.
pub struct DataCleaner;

impl DataCleaner {
    /// Clean a loaded table.
    ///
    /// The sequence is fixed: headers first (everything downstream matches on
    /// normalized names), then coercion, then infinity replacement, then
    /// imputation over what remains missing.
    pub fn clean(&self, df: DataFrame, config: &PipelineConfig) -> Result<CleanOutcome> {
        let mut actions = Vec::new();

        info!("Cleaning table ({} rows x {} columns)...", df.height(), df.width());

        // 1. Normalize headers, drop duplicate columns
        let (mut df, renamed, dropped) = headers::normalize_headers(&df)?;
        if !renamed.is_empty() {
            actions.push(format!(
                "Normalized {} header(s): {:?}",
                renamed.len(),
                renamed
            ));
            debug!("Normalized headers: {:?}", renamed);
        }
        if dropped > 0 {
            actions.push(format!("Dropped {} duplicate column(s)", dropped));
        }

        // 2. Coerce fully-numeric string columns
        let coerced = coercion::coerce_numeric_columns(&mut df)?;
        if !coerced.is_empty() {
            actions.push(format!(
                "Coerced {} column(s) to numeric: {:?}",
                coerced.len(),
                coerced
            ));
        }

        // 3. Replace non-finite values with null
        let infinities = coercion::replace_infinities(&mut df)?;
        if infinities > 0 {
            actions.push(format!(
                "Replaced {} non-finite value(s) with null",
                infinities
            ));
        }

        // 4. Impute remaining missing numeric values
        let imputed = self.impute_numeric_nulls(&mut df, config, &mut actions)?;

        info!(
            "Cleaning complete: {} coerced, {} infinities nulled, {} cells imputed",
            coerced.len(),
            infinities,
            imputed
        );

        Ok(CleanOutcome {
            df,
            actions,
            duplicate_headers_dropped: dropped,
            coerced_columns: coerced,
            infinities_replaced: infinities,
            imputed_cells: imputed,
        })
    }

    /// Fill nulls in every numeric column with the configured statistic.
    fn impute_numeric_nulls(
        &self,
        df: &mut DataFrame,
        config: &PipelineConfig,
        actions: &mut Vec<String>,
    ) -> Result<usize> {
        let numeric_cols: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()) && col.null_count() > 0)
            .map(|col| col.name().to_string())
            .collect();

        let mut imputed = 0usize;

        for col_name in &numeric_cols {
            imputed += match config.numeric_imputation {
                NumericImputation::Median => {
                    StatisticalImputer::apply_numeric_median(df, col_name, actions)?
                }
                NumericImputation::Mean => {
                    StatisticalImputer::apply_numeric_mean(df, col_name, actions)?
                }
            };
        }

        // A column whose values were all missing has no median; fall back so
        // no numeric null survives cleaning.
        for col_name in &numeric_cols {
            let still_null = df.column(col_name)?.null_count();
            if still_null > 0 {
                warn!(
                    "Column '{}' had no finite values; filling {} cells with 0.0",
                    col_name, still_null
                );
                let filled = {
                    let series = df.column(col_name)?.as_materialized_series();
                    crate::utils::fill_numeric_nulls(series, 0.0)?
                };
                df.replace(col_name, filled)?;
                actions.push(format!(
                    "Filled {} cells in all-missing column '{}' with 0.0",
                    still_null, col_name
                ));
                imputed += still_null;
            }
        }

        Ok(imputed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    fn clean(df: DataFrame) -> CleanOutcome {
        DataCleaner
            .clean(df, &PipelineConfig::default())
            .expect("cleaning should succeed")
    }

    #[test]
    fn test_clean_full_sequence() {
        let df = DataFrame::new(vec![
            Series::new("Country".into(), &["A", "B", "C", "D"]).into(),
            Series::new("Life\u{a0}expectancy ".into(), &["50", "60", "", "70"]).into(),
            Series::new("GDP".into(), &[Some(100.0), Some(f64::INFINITY), Some(300.0), None]).into(),
        ])
        .unwrap();

        let outcome = clean(df);

        // Header normalized
        let life = outcome.df.column("Life expectancy").unwrap();
        // Coerced to numeric, empty string treated as missing and imputed
        assert!(matches!(life.dtype(), DataType::Float64));
        assert_eq!(life.null_count(), 0);
        // Median of [50, 60, 70] = 60
        assert_eq!(life.get(2).unwrap().try_extract::<f64>().unwrap(), 60.0);

        // Infinity nulled then imputed with median of [100, 300] = 200
        let gdp = outcome.df.column("GDP").unwrap();
        assert_eq!(gdp.null_count(), 0);
        assert_eq!(gdp.get(1).unwrap().try_extract::<f64>().unwrap(), 200.0);
        assert_eq!(outcome.infinities_replaced, 1);

        // Country untouched
        assert!(matches!(
            outcome.df.column("Country").unwrap().dtype(),
            DataType::String
        ));
    }

    #[test]
    fn test_clean_no_numeric_nulls_remain() {
        let df = df![
            "a" => [Some(1.0), None, Some(f64::NAN), Some(4.0)],
            "b" => [None, Some(2.0), None, None],
        ]
        .unwrap();

        let outcome = clean(df);

        for col in outcome.df.get_columns() {
            assert_eq!(col.null_count(), 0, "column {} still has nulls", col.name());
            let ca = col
                .as_materialized_series()
                .cast(&DataType::Float64)
                .unwrap();
            for v in ca.f64().unwrap().into_iter().flatten() {
                assert!(v.is_finite());
            }
        }
    }

    #[test]
    fn test_clean_mean_strategy() {
        let config = PipelineConfig::builder()
            .numeric_imputation(NumericImputation::Mean)
            .build()
            .unwrap();

        let df = df![
            "v" => [Some(1.0), None, Some(5.0)],
        ]
        .unwrap();

        let outcome = DataCleaner.clean(df, &config).unwrap();
        let v = outcome.df.column("v").unwrap();
        assert_eq!(v.get(1).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_clean_actions_recorded() {
        let df = DataFrame::new(vec![
            Series::new("x ".into(), &["1", "2"]).into(),
        ])
        .unwrap();

        let outcome = clean(df);
        assert!(outcome.actions.iter().any(|a| a.contains("Normalized")));
        assert!(outcome.actions.iter().any(|a| a.contains("Coerced")));
        assert_eq!(outcome.coerced_columns, vec!["x".to_string()]);
    }
}
