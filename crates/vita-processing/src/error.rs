//! Custom error types for the data preparation pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Errors are
//! serializable so a frontend can receive them as `{code, message}` pairs.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the preparation pipeline.
#[derive(Error, Debug)]
pub enum PrepError {
    /// Input file does not exist or is not a file.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The loaded table has zero data rows. Median imputation and
    /// normalization bounds are undefined over an empty table, so the
    /// loader rejects it instead of letting NaN propagate.
    #[error("Dataset has no data rows")]
    EmptyDataset,

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// No header matched a required semantic role's keyword set.
    #[error("No column matches role '{role}' (keywords: {keywords:?})")]
    RoleNotResolved {
        role: String,
        keywords: Vec<String>,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data cleaning failed.
    #[error("Failed to clean table: {0}")]
    CleaningFailed(String),

    /// Index derivation failed.
    #[error("Failed to derive index '{index}': {reason}")]
    DerivationFailed { index: String, reason: String },

    /// Export of the filtered selection failed.
    #[error("Failed to export selection: {0}")]
    ExportFailed(String),

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PrepError>,
    },
}

impl PrepError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PrepError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InputNotFound(_) => "INPUT_NOT_FOUND",
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::RoleNotResolved { .. } => "ROLE_NOT_RESOLVED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::CleaningFailed(_) => "CLEANING_FAILED",
            Self::DerivationFailed { .. } => "DERIVATION_FAILED",
            Self::ExportFailed(_) => "EXPORT_FAILED",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error points at the source data rather than the code
    /// (bad file, bad headers, empty table).
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::InputNotFound(_)
                | Self::EmptyDataset
                | Self::ColumnNotFound(_)
                | Self::RoleNotResolved { .. }
        ) || matches!(self, Self::WithContext { source, .. } if source.is_data_error())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields,
/// making them easy to handle in a frontend.
impl Serialize for PrepError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PrepError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PrepError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(PrepError::EmptyDataset.error_code(), "EMPTY_DATASET");
        assert_eq!(
            PrepError::ColumnNotFound("Year".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_is_data_error() {
        assert!(PrepError::EmptyDataset.is_data_error());
        assert!(
            PrepError::RoleNotResolved {
                role: "gdp".to_string(),
                keywords: vec!["gdp".to_string()],
            }
            .is_data_error()
        );
        assert!(!PrepError::CleaningFailed("oops".to_string()).is_data_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = PrepError::ColumnNotFound("Country".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Country"));
    }

    #[test]
    fn test_with_context() {
        let error = PrepError::EmptyDataset.with_context("While loading data/life.csv");
        assert!(error.to_string().contains("While loading"));
        assert_eq!(error.error_code(), "EMPTY_DATASET"); // Preserves original code
    }

    #[test]
    fn test_with_context_preserves_data_error() {
        let error = PrepError::EmptyDataset.with_context("load");
        assert!(error.is_data_error());
    }
}
