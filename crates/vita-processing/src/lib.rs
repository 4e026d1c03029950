//! Data Preparation & KPI Derivation Library
//!
//! The backend every page of a life-expectancy dashboard runs on: load a
//! tabular dataset, clean it, resolve indicator columns by semantic role,
//! and derive composite indices, built with Rust and Polars.
//!
//! # Overview
//!
//! Each page load is one synchronous pass:
//!
//! - **Loading**: delimited file with a header row, multi-strategy CSV
//!   fallbacks
//! - **Cleaning**: header normalization, duplicate-header removal, numeric
//!   coercion, infinity replacement, median imputation
//! - **Column Registry**: semantic roles resolved to literal headers via
//!   keyword detection with a shortest-match tie-break
//! - **KPI Derivation**: min-max normalization (degenerate columns yield a
//!   constant 0.5) and three composite indices: Health Index, Economic
//!   Index, Mortality Pressure
//! - **Selection & Export**: year/country filters and CSV export of the
//!   filtered rows, derived columns excluded
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vita_processing::{Pipeline, PipelineConfig, Selection, YearSelection, CountrySelection};
//!
//! let result = Pipeline::builder()
//!     .config(PipelineConfig::builder().cache_tables(true).build()?)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process_path("data/life_expectancy.csv".as_ref())?;
//!
//! let selection = Selection {
//!     years: YearSelection::Range { from: 2005, to: 2015 },
//!     countries: CountrySelection::Only(vec!["France".into(), "Japan".into()]),
//! };
//! let filtered = selection.apply(&result.table)?;
//! vita_processing::export::export_filtered(&filtered, "output/filtered.csv".as_ref())?;
//! ```
//!
//! # Normalization contract
//!
//! Min-max bounds are taken over the frame a derivation call receives, never
//! fixed globally. Re-deriving over a filtered subset changes every index
//! value, including for rows present in both frames; index values are only
//! comparable within one derivation pass.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod export;
pub mod imputers;
pub mod kpi;
pub mod loader;
pub mod pipeline;
pub mod registry;
pub mod reporting;
pub mod selection;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{CleanOutcome, DataCleaner};
pub use config::{
    ConfigValidationError, MissingRolePolicy, NumericImputation, PipelineConfig,
    PipelineConfigBuilder, DEGENERATE_NORM_FILL,
};
pub use error::{PrepError, ResultExt};
pub use export::{export_filtered, strip_derived_columns};
pub use imputers::StatisticalImputer;
pub use kpi::{
    min_max, CompositeIndex, KpiDeriver, DERIVED_COLUMNS, ECONOMIC_INDEX, HEALTH_INDEX,
    MORTALITY_PRESSURE,
};
pub use loader::{read_table, TableCache};
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PrepStage, ProgressReporter,
    ProgressUpdate,
};
pub use registry::{detect_col, ColumnRegistry, SemanticRole};
pub use reporting::{PrepReport, ReportGenerator};
pub use selection::{
    column_mean, distinct_countries, distinct_years, snapshot, CountrySelection, Selection,
    YearSelection, COUNTRY_COLUMN, YEAR_COLUMN,
};
pub use types::{PrepResult, PrepSummary};
