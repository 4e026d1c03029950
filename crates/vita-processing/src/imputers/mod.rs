//! Missing value imputation.
//!
//! The cleaner guarantees that every numeric column leaves the pipeline with
//! no nulls; the statistical imputer is how it gets there.

mod statistical;

pub use statistical::StatisticalImputer;
