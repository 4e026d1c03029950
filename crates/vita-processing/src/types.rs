//! Result and summary types for the preparation pipeline.

use crate::registry::ColumnRegistry;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Human-readable summary of what one preparation pass did.
///
/// Serializable so a frontend or the JSON report can display it directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrepSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of data rows.
    pub rows: usize,
    /// Number of columns before duplicate-header removal.
    pub columns_before: usize,
    /// Number of columns after cleaning, including derived columns.
    pub columns_after: usize,

    /// Duplicate header columns dropped.
    pub duplicate_headers_dropped: usize,
    /// String columns rebuilt as numeric.
    pub coerced_columns: Vec<String>,
    /// Non-finite cells replaced with null before imputation.
    pub infinities_replaced: usize,
    /// Missing numeric cells filled.
    pub imputed_cells: usize,

    /// Role label -> resolved header.
    pub resolved_roles: BTreeMap<String, String>,
    /// Derived index columns appended.
    pub derived_columns: Vec<String>,

    /// Non-fatal problems worth surfacing (skipped indices, odd columns).
    pub warnings: Vec<String>,
}

impl PrepSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a non-fatal warning.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Everything one preparation pass produces: the cleaned and derived table,
/// the resolved registry, and the bookkeeping.
#[derive(Debug, Clone)]
pub struct PrepResult {
    /// Cleaned table with derived index columns appended.
    pub table: DataFrame,
    /// Semantic role -> header mapping used for derivation.
    pub registry: ColumnRegistry,
    /// Serializable summary of the pass.
    pub summary: PrepSummary,
    /// Action strings from the cleaning stage.
    pub cleaning_actions: Vec<String>,
    /// Step strings from the derivation stage.
    pub derivation_steps: Vec<String>,
}
