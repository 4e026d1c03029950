//! Numeric coercion and infinity replacement.

use crate::utils::{is_float_dtype, parse_numeric_string};
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Rebuild as `Float64` every string column whose non-null values all parse
/// as numbers. Columns with any non-numeric value (the Country column, for
/// one) stay text. Returns the names of the coerced columns.
pub(crate) fn coerce_numeric_columns(df: &mut DataFrame) -> Result<Vec<String>> {
    let column_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    let mut coerced = Vec::new();

    for col_name in &column_names {
        let parsed = {
            let series = df.column(col_name)?.as_materialized_series();
            if series.dtype() != &DataType::String {
                continue;
            }
            parse_all_numeric(series)?
        };

        if let Some(values) = parsed {
            debug!("Coercing '{}' from String to Float64", col_name);
            df.replace(col_name, Series::new(col_name.as_str().into(), values))?;
            coerced.push(col_name.clone());
        }
    }

    Ok(coerced)
}

/// Parse every non-null value of a string series as f64.
///
/// Returns `None` if any value fails to parse or the series has no non-null
/// values at all (an all-null column carries no evidence of being numeric).
fn parse_all_numeric(series: &Series) -> Result<Option<Vec<Option<f64>>>> {
    let str_series = series.str()?;
    let mut values = Vec::with_capacity(str_series.len());
    let mut non_null = 0usize;

    for opt_val in str_series.into_iter() {
        match opt_val {
            Some(val) if val.trim().is_empty() => values.push(None),
            Some(val) => match parse_numeric_string(val) {
                Some(num) => {
                    non_null += 1;
                    values.push(Some(num));
                }
                None => return Ok(None),
            },
            None => values.push(None),
        }
    }

    if non_null == 0 {
        return Ok(None);
    }
    Ok(Some(values))
}

/// Replace every non-finite value (±inf, NaN) in float columns with null so
/// imputation treats them as missing. Returns the number of cells replaced.
pub(crate) fn replace_infinities(df: &mut DataFrame) -> Result<usize> {
    let column_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    let mut replaced = 0usize;

    for col_name in &column_names {
        let rebuilt = {
            let series = df.column(col_name)?.as_materialized_series();
            if !is_float_dtype(series.dtype()) {
                continue;
            }

            let float_series = series.cast(&DataType::Float64)?;
            let ca = float_series.f64()?;

            let mut count = 0usize;
            let values: Vec<Option<f64>> = ca
                .into_iter()
                .map(|opt| match opt {
                    Some(v) if !v.is_finite() => {
                        count += 1;
                        None
                    }
                    other => other,
                })
                .collect();

            if count == 0 {
                continue;
            }
            replaced += count;
            Series::new(col_name.as_str().into(), values)
        };

        df.replace(col_name, rebuilt)?;
    }

    if replaced > 0 {
        debug!("Replaced {} non-finite values with null", replaced);
    }

    Ok(replaced)
}
