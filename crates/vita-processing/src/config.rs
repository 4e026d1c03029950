//! Configuration types for the data preparation pipeline.
//!
//! This module provides configuration options using the builder pattern,
//! plus the two named policy constants the pipeline relies on so tests can
//! assert on them directly instead of rediscovering magic numbers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Value every element of a min-max normalized column takes when the column
/// is degenerate (zero variance, or no finite values at all). Keeping the
/// degenerate output constant at the midpoint keeps downstream composite
/// averages well-defined instead of propagating NaN.
pub const DEGENERATE_NORM_FILL: f64 = 0.5;

/// Strategy for imputing missing numeric values after infinity replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NumericImputation {
    /// Use the median of non-null values
    #[default]
    Median,
    /// Use the mean of non-null values
    Mean,
}

/// Policy when a semantic role has no matching header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MissingRolePolicy {
    /// Fail the whole derivation with a descriptive error
    #[default]
    Fail,
    /// Omit every index depending on the missing role and record a warning
    Skip,
}

/// Configuration for the preparation pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration with a
/// fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use vita_processing::config::{PipelineConfig, MissingRolePolicy};
///
/// let config = PipelineConfig::builder()
///     .missing_role_policy(MissingRolePolicy::Skip)
///     .cache_tables(true)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Strategy for imputing missing numeric values.
    /// Default: Median
    pub numeric_imputation: NumericImputation,

    /// Policy when a semantic role cannot be resolved to a header.
    /// Default: Fail
    pub missing_role_policy: MissingRolePolicy,

    /// Fill value for degenerate min-max normalization (0.0 - 1.0).
    /// Default: [`DEGENERATE_NORM_FILL`]
    pub degenerate_fill: f64,

    /// Whether to memoize prepared tables keyed on the canonical file path.
    /// Only useful when the source file never changes within a process.
    /// Default: false
    pub cache_tables: bool,

    /// Number of rows the CSV reader inspects for schema inference.
    /// Default: 100
    pub infer_schema_rows: usize,

    /// Output directory for exports and reports.
    /// Default: "output"
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            numeric_imputation: NumericImputation::default(),
            missing_role_policy: MissingRolePolicy::default(),
            degenerate_fill: DEGENERATE_NORM_FILL,
            cache_tables: false,
            infer_schema_rows: 100,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.degenerate_fill) {
            return Err(ConfigValidationError::InvalidFill(self.degenerate_fill));
        }

        if self.infer_schema_rows == 0 {
            return Err(ConfigValidationError::InvalidInferRows(
                self.infer_schema_rows,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid degenerate fill value: {0} (must be between 0.0 and 1.0)")]
    InvalidFill(f64),

    #[error("Invalid schema inference row count: {0} (must be at least 1)")]
    InvalidInferRows(usize),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    numeric_imputation: Option<NumericImputation>,
    missing_role_policy: Option<MissingRolePolicy>,
    degenerate_fill: Option<f64>,
    cache_tables: Option<bool>,
    infer_schema_rows: Option<usize>,
    output_dir: Option<PathBuf>,
}

impl PipelineConfigBuilder {
    /// Set the numeric imputation strategy.
    pub fn numeric_imputation(mut self, strategy: NumericImputation) -> Self {
        self.numeric_imputation = Some(strategy);
        self
    }

    /// Set the policy for unresolvable semantic roles.
    pub fn missing_role_policy(mut self, policy: MissingRolePolicy) -> Self {
        self.missing_role_policy = Some(policy);
        self
    }

    /// Set the fill value used for degenerate normalization.
    ///
    /// # Arguments
    /// * `fill` - Value between 0.0 and 1.0
    pub fn degenerate_fill(mut self, fill: f64) -> Self {
        self.degenerate_fill = Some(fill);
        self
    }

    /// Enable or disable in-process table memoization.
    pub fn cache_tables(mut self, cache: bool) -> Self {
        self.cache_tables = Some(cache);
        self
    }

    /// Set the number of rows inspected for CSV schema inference.
    pub fn infer_schema_rows(mut self, rows: usize) -> Self {
        self.infer_schema_rows = Some(rows);
        self
    }

    /// Set the output directory for exports and reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            numeric_imputation: self.numeric_imputation.unwrap_or_default(),
            missing_role_policy: self.missing_role_policy.unwrap_or_default(),
            degenerate_fill: self.degenerate_fill.unwrap_or(DEGENERATE_NORM_FILL),
            cache_tables: self.cache_tables.unwrap_or(false),
            infer_schema_rows: self.infer_schema_rows.unwrap_or(100),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("output")),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.numeric_imputation, NumericImputation::Median);
        assert_eq!(config.missing_role_policy, MissingRolePolicy::Fail);
        assert_eq!(config.degenerate_fill, DEGENERATE_NORM_FILL);
        assert_eq!(config.infer_schema_rows, 100);
        assert!(!config.cache_tables);
    }

    #[test]
    fn test_builder_defaults() {
        let config = PipelineConfig::builder().build().unwrap();
        assert_eq!(config.degenerate_fill, 0.5);
        assert_eq!(config.missing_role_policy, MissingRolePolicy::Fail);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .numeric_imputation(NumericImputation::Mean)
            .missing_role_policy(MissingRolePolicy::Skip)
            .cache_tables(true)
            .infer_schema_rows(500)
            .output_dir("exports")
            .build()
            .unwrap();

        assert_eq!(config.numeric_imputation, NumericImputation::Mean);
        assert_eq!(config.missing_role_policy, MissingRolePolicy::Skip);
        assert!(config.cache_tables);
        assert_eq!(config.infer_schema_rows, 500);
        assert_eq!(config.output_dir.to_str().unwrap(), "exports");
    }

    #[test]
    fn test_validation_invalid_fill() {
        let result = PipelineConfig::builder().degenerate_fill(1.5).build();

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidFill(_)
        ));
    }

    #[test]
    fn test_validation_invalid_infer_rows() {
        let result = PipelineConfig::builder().infer_schema_rows(0).build();

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidInferRows(0)
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.degenerate_fill, deserialized.degenerate_fill);
        assert_eq!(config.missing_role_policy, deserialized.missing_role_policy);
    }
}
