//! Statistical imputation methods.
//!
//! Provides median and mean imputation for numeric columns. Imputation runs
//! after infinity replacement, so the statistic is computed over finite
//! values only.

use crate::utils::fill_numeric_nulls;
use anyhow::Result;
use polars::prelude::*;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Apply median imputation to a numeric column.
    ///
    /// Returns the number of cells filled.
    pub fn apply_numeric_median(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<usize> {
        let median_val = if let Ok(col) = df.column(col_name) {
            col.as_materialized_series().median()
        } else {
            None
        };

        if let Some(median_val) = median_val {
            Self::fill_with_value(df, col_name, median_val, processing_steps, "median")
        } else {
            Ok(0)
        }
    }

    /// Apply mean imputation to a numeric column.
    ///
    /// Returns the number of cells filled.
    pub fn apply_numeric_mean(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<usize> {
        let mean_val = if let Ok(col) = df.column(col_name) {
            col.as_materialized_series().mean()
        } else {
            None
        };

        if let Some(mean_val) = mean_val {
            Self::fill_with_value(df, col_name, mean_val, processing_steps, "mean")
        } else {
            Ok(0)
        }
    }

    /// Fill nulls in a numeric column with a specific value.
    fn fill_with_value(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: f64,
        processing_steps: &mut Vec<String>,
        method: &str,
    ) -> Result<usize> {
        let (filled, null_count) = {
            let series = df.column(col_name)?.as_materialized_series();
            let null_count = series.null_count();
            if null_count == 0 {
                return Ok(0);
            }
            (fill_numeric_nulls(series, fill_value)?, null_count)
        };

        df.replace(col_name, filled)?;

        processing_steps.push(format!(
            "Filled {} cells in '{}' with {}: {:.2}",
            null_count, col_name, method, fill_value
        ));

        Ok(null_count)
    }
}
