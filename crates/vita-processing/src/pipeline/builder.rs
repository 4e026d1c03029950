//! The main preparation pipeline.
//!
//! One `process` call is one page load: clean the table, resolve the column
//! registry, derive the composite indices. The frame is treated as immutable
//! after the pass; no locking is needed beyond the optional cache map.

use crate::cleaner::DataCleaner;
use crate::config::PipelineConfig;
use crate::error::{PrepError, Result};
use crate::kpi::KpiDeriver;
use crate::loader::{self, TableCache};
use crate::pipeline::progress::{
    ClosureProgressReporter, PrepStage, ProgressReporter, ProgressUpdate,
};
use crate::registry::ColumnRegistry;
use crate::types::{PrepResult, PrepSummary};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// The preparation pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom
/// configuration.
///
/// # Example
///
/// ```rust,ignore
/// use vita_processing::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::default())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process_path("data/life_expectancy.csv".as_ref())?;
///
/// println!("{} rows, indices: {:?}", result.table.height(), result.summary.derived_columns);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: DataCleaner,
    deriver: KpiDeriver,
    cache: TableCache,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "progress_reporter",
                &self.progress_reporter.as_ref().map(|_| "<reporter>"),
            )
            .finish_non_exhaustive()
    }
}

// The pipeline moves into background tasks in GUI embeddings.
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the preparation pass over an already-loaded frame.
    pub fn process(&self, df: DataFrame) -> Result<PrepResult> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Preparation complete"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Load a file and run the preparation pass, consulting the cache when
    /// enabled.
    pub fn process_path(&self, path: &Path) -> Result<Arc<PrepResult>> {
        if self.config.cache_tables
            && let Some(cached) = self.cache.get(path)
        {
            info!("Cache hit for {}", path.display());
            self.report_progress(ProgressUpdate::complete("Served from cache"));
            return Ok(cached);
        }

        self.report_progress(ProgressUpdate::new(
            PrepStage::Loading,
            0.0,
            format!("Loading {}", path.display()),
        ));
        let df = loader::read_table(path, self.config.infer_schema_rows)?;
        self.report_progress(ProgressUpdate::new(PrepStage::Loading, 1.0, "Table loaded"));

        let result = self.process(df)?;

        if self.config.cache_tables {
            Ok(self.cache.insert(path, result))
        } else {
            Ok(Arc::new(result))
        }
    }

    fn process_internal(&self, df: DataFrame) -> Result<PrepResult> {
        let start_time = Instant::now();

        info!("Starting preparation pipeline...");

        if df.height() == 0 {
            return Err(PrepError::EmptyDataset);
        }

        let mut summary = PrepSummary::new();
        summary.rows = df.height();
        summary.columns_before = df.width();

        // Step 1: clean
        self.report_progress(ProgressUpdate::new(
            PrepStage::Cleaning,
            0.0,
            "Cleaning table...",
        ));
        info!("Step 1: Cleaning table...");

        let outcome = self
            .cleaner
            .clean(df, &self.config)
            .map_err(|e| PrepError::CleaningFailed(e.to_string()))?;

        let mut df = outcome.df;
        summary.duplicate_headers_dropped = outcome.duplicate_headers_dropped;
        summary.coerced_columns = outcome.coerced_columns;
        summary.infinities_replaced = outcome.infinities_replaced;
        summary.imputed_cells = outcome.imputed_cells;

        self.report_progress(ProgressUpdate::new(
            PrepStage::Cleaning,
            1.0,
            "Cleaning complete",
        ));

        // Step 2: resolve the column registry
        self.report_progress(ProgressUpdate::new(
            PrepStage::ResolvingColumns,
            0.0,
            "Resolving semantic columns...",
        ));
        info!("Step 2: Resolving semantic columns...");

        let (registry, role_warnings) =
            ColumnRegistry::resolve(&df, self.config.missing_role_policy)?;
        for warning in role_warnings {
            summary.add_warning(warning);
        }
        summary.resolved_roles = registry.as_label_map();

        self.report_progress(ProgressUpdate::new(
            PrepStage::ResolvingColumns,
            1.0,
            format!("{} roles resolved", summary.resolved_roles.len()),
        ));

        // Step 3: derive composite indices
        self.report_progress(ProgressUpdate::new(
            PrepStage::DerivingIndices,
            0.0,
            "Deriving composite indices...",
        ));
        info!("Step 3: Deriving composite indices...");

        let (derived, derivation_steps) = self.deriver.derive(&mut df, &registry, &self.config)?;
        summary.derived_columns = derived;

        self.report_progress(ProgressUpdate::new(
            PrepStage::DerivingIndices,
            1.0,
            format!("Derived {} indices", summary.derived_columns.len()),
        ));

        summary.columns_after = df.width();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Preparation complete: {} rows x {} columns in {}ms",
            summary.rows, summary.columns_after, summary.duration_ms
        );

        Ok(PrepResult {
            table: df,
            registry,
            summary,
            cleaning_actions: outcome.actions,
            derivation_steps,
        })
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }
}

/// Builder for [`Pipeline`] with fluent API.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a closure-based progress callback.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| PrepError::InvalidConfig(e.to_string()))?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            cleaner: DataCleaner,
            deriver: KpiDeriver,
            cache: TableCache::new(),
        })
    }
}
