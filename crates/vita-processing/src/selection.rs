//! Year/country selection over the prepared table.
//!
//! Selections are pure filter predicates consumed by the presentation layer.
//! An empty result is valid: empty charts and tables, never a crash.

use crate::error::{PrepError, Result};
use polars::prelude::*;
use std::collections::HashSet;

/// Header of the country identifier column.
pub const COUNTRY_COLUMN: &str = "Country";
/// Header of the year identifier column.
pub const YEAR_COLUMN: &str = "Year";

/// Year predicate: everything, one year, or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSelection {
    All,
    Single(i64),
    Range { from: i64, to: i64 },
}

impl YearSelection {
    fn matches(&self, year: i64) -> bool {
        match self {
            YearSelection::All => true,
            YearSelection::Single(y) => year == *y,
            YearSelection::Range { from, to } => (*from..=*to).contains(&year),
        }
    }
}

/// Country predicate: everything or an explicit set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountrySelection {
    All,
    Only(Vec<String>),
}

/// A filter over the prepared table.
#[derive(Debug, Clone)]
pub struct Selection {
    pub years: YearSelection,
    pub countries: CountrySelection,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            years: YearSelection::All,
            countries: CountrySelection::All,
        }
    }
}

impl Selection {
    /// Apply the selection, returning the matching rows.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let year_values = year_column(df)?;
        let country_values = country_column(df)?;

        let wanted: Option<HashSet<&str>> = match &self.countries {
            CountrySelection::All => None,
            CountrySelection::Only(list) => {
                Some(list.iter().map(|s| s.as_str()).collect())
            }
        };

        let mask_vec: Vec<bool> = year_values
            .iter()
            .zip(country_values.iter())
            .map(|(year, country)| {
                let year_ok = year.map(|y| self.years.matches(y)).unwrap_or(false);
                let country_ok = match (&wanted, country) {
                    (None, _) => true,
                    (Some(set), Some(c)) => set.contains(c.as_str()),
                    (Some(_), None) => false,
                };
                year_ok && country_ok
            })
            .collect();

        let mask = Series::new("selection".into(), mask_vec);
        Ok(df.filter(mask.bool()?)?)
    }
}

/// The single row for a (country, year) pair, or `None` when the pair is not
/// observed.
pub fn snapshot(df: &DataFrame, country: &str, year: i64) -> Result<Option<DataFrame>> {
    let selection = Selection {
        years: YearSelection::Single(year),
        countries: CountrySelection::Only(vec![country.to_string()]),
    };
    let filtered = selection.apply(df)?;

    if filtered.height() == 0 {
        Ok(None)
    } else {
        Ok(Some(filtered.head(Some(1))))
    }
}

/// Distinct observed years, ascending.
pub fn distinct_years(df: &DataFrame) -> Result<Vec<i64>> {
    let mut years: Vec<i64> = year_column(df)?.into_iter().flatten().collect();
    years.sort_unstable();
    years.dedup();
    Ok(years)
}

/// Distinct observed countries, lexicographic.
pub fn distinct_countries(df: &DataFrame) -> Result<Vec<String>> {
    let mut countries: Vec<String> = country_column(df)?.into_iter().flatten().collect();
    countries.sort_unstable();
    countries.dedup();
    Ok(countries)
}

/// Mean of a numeric column over the whole frame ("global average" in the
/// overview interpretation line). `None` over an empty frame.
pub fn column_mean(df: &DataFrame, column: &str) -> Result<Option<f64>> {
    let series = df
        .column(column)
        .map_err(|_| PrepError::ColumnNotFound(column.to_string()))?
        .as_materialized_series();
    Ok(series.mean())
}

fn year_column(df: &DataFrame) -> Result<Vec<Option<i64>>> {
    let series = df
        .column(YEAR_COLUMN)
        .map_err(|_| PrepError::ColumnNotFound(YEAR_COLUMN.to_string()))?
        .as_materialized_series();
    let cast = series.cast(&DataType::Int64)?;
    Ok(cast.i64()?.into_iter().collect())
}

fn country_column(df: &DataFrame) -> Result<Vec<Option<String>>> {
    let series = df
        .column(COUNTRY_COLUMN)
        .map_err(|_| PrepError::ColumnNotFound(COUNTRY_COLUMN.to_string()))?
        .as_materialized_series();
    let ca = series.str()?;
    Ok(ca.into_iter().map(|v| v.map(|s| s.to_string())).collect())
}
