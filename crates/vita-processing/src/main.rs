//! CLI entry point for the data preparation pipeline.

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use vita_processing::{
    cleaner::normalize_header, registry::detect_col, CountrySelection, MissingRolePolicy,
    NumericImputation, Pipeline, PipelineConfig, PrepResult, ReportGenerator, Selection,
    SemanticRole, YearSelection,
};

/// CLI-compatible numeric imputation enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliImputation {
    /// Use the median of non-null values
    Median,
    /// Use the mean of non-null values
    Mean,
}

impl From<CliImputation> for NumericImputation {
    fn from(cli: CliImputation) -> Self {
        match cli {
            CliImputation::Median => NumericImputation::Median,
            CliImputation::Mean => NumericImputation::Mean,
        }
    }
}

/// CLI-compatible missing role policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingRole {
    /// Fail the derivation when a role has no matching column
    Fail,
    /// Omit indices depending on the missing role
    Skip,
}

impl From<CliMissingRole> for MissingRolePolicy {
    fn from(cli: CliMissingRole) -> Self {
        match cli {
            CliMissingRole::Fail => MissingRolePolicy::Fail,
            CliMissingRole::Skip => MissingRolePolicy::Skip,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Data preparation and KPI derivation for life-expectancy dashboards",
    long_about = "Loads a tabular dataset, cleans it, resolves indicator columns by\n\
                  semantic role, and derives the composite indices every dashboard\n\
                  page consumes.\n\n\
                  EXAMPLES:\n  \
                  # Prepare a dataset and print a summary\n  \
                  vita-processing -i data/life.csv\n\n  \
                  # Preview what preparation would do\n  \
                  vita-processing -i data/life.csv --dry-run\n\n  \
                  # Export France and Japan, 2005-2015\n  \
                  vita-processing -i data/life.csv -c France -c Japan \\\n      \
                  --year-from 2005 --year-to 2015 --export output/filtered.csv"
)]
struct Args {
    /// Path to the tabular data file to prepare
    #[arg(short, long)]
    input: String,

    /// Output directory for reports
    #[arg(short, long, default_value = "./output")]
    output: String,

    /// Export the filtered selection as CSV to this path
    #[arg(long)]
    export: Option<String>,

    /// Filter to a single year
    #[arg(long, conflicts_with_all = ["year_from", "year_to"])]
    year: Option<i64>,

    /// Filter years from this value (inclusive)
    #[arg(long)]
    year_from: Option<i64>,

    /// Filter years up to this value (inclusive)
    #[arg(long)]
    year_to: Option<i64>,

    /// Filter to these countries (repeatable)
    #[arg(short, long)]
    country: Vec<String>,

    /// Preview cleaning and column resolution without deriving
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and the final result)
    #[arg(short, long)]
    quiet: bool,

    /// Strategy for imputing missing numeric values
    #[arg(long, value_enum, default_value = "median")]
    imputation: CliImputation,

    /// Policy when an indicator role has no matching column
    #[arg(long, value_enum, default_value = "fail")]
    missing_role: CliMissingRole,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    if args.dry_run {
        return run_dry_run(&args);
    }

    let config = PipelineConfig::builder()
        .numeric_imputation(args.imputation.into())
        .missing_role_policy(args.missing_role.into())
        .output_dir(&args.output)
        .build()?;

    let pipeline = build_pipeline(&args, config)?;

    info!("Preparing dataset: {}", args.input);
    let result = match pipeline.process_path(Path::new(&args.input)) {
        Ok(result) => result,
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            error!("Preparation failed: {}", e);
            return Err(anyhow!("Preparation failed: {}", e));
        }
    };

    let selection = selection_from_args(&args);
    let filtered = selection.apply(&result.table)?;

    if let Some(ref export_path) = args.export {
        vita_processing::export_filtered(&filtered, Path::new(export_path))?;
    }

    let report = ReportGenerator::build_report(&args.input, &result);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.emit_report {
        let stem = extract_file_stem(&args.input);
        ReportGenerator::write_report_to_file(&report, &PathBuf::from(&args.output), &stem)?;
    }

    print_human_readable_summary(&result, filtered.height(), &args);

    Ok(())
}

/// Build the year/country selection from CLI flags.
fn selection_from_args(args: &Args) -> Selection {
    let years = if let Some(year) = args.year {
        YearSelection::Single(year)
    } else if args.year_from.is_some() || args.year_to.is_some() {
        YearSelection::Range {
            from: args.year_from.unwrap_or(i64::MIN),
            to: args.year_to.unwrap_or(i64::MAX),
        }
    } else {
        YearSelection::All
    };

    let countries = if args.country.is_empty() {
        CountrySelection::All
    } else {
        CountrySelection::Only(args.country.clone())
    };

    Selection { years, countries }
}

/// Run dry-run mode - show what preparation would do without deriving.
///
/// Note: this function uses `println!` intentionally for user-facing CLI
/// output. Unlike logging, this output should always be visible since it's
/// the primary purpose of --dry-run.
fn run_dry_run(args: &Args) -> Result<()> {
    let df = vita_processing::read_table(Path::new(&args.input), 100)?;

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of preparation actions");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input);
    println!("  Rows: {}", df.height());
    println!("  Columns: {}", df.width());
    println!();

    println!("HEADER NORMALIZATION PREVIEW");
    println!("{}", "-".repeat(40));
    let mut any_renames = false;
    for name in df.get_column_names() {
        let normalized = normalize_header(name);
        if normalized != name.as_str() {
            println!("  '{}' -> '{}'", name, normalized);
            any_renames = true;
        }
    }
    if !any_renames {
        println!("  All headers already normalized");
    }
    println!();

    println!("COLUMN RESOLUTION PREVIEW");
    println!("{}", "-".repeat(40));
    println!("{:<24} {:<32} {}", "Role", "Column", "Keywords");
    println!("{}", "-".repeat(70));

    let headers: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| normalize_header(s))
        .collect();

    for role in SemanticRole::ALL {
        let resolved = detect_col(&headers, role.keywords()).unwrap_or("NOT FOUND");
        println!(
            "{:<24} {:<32} {:?}",
            role.label(),
            resolved,
            role.keywords()
        );
    }
    println!();

    println!("PROPOSED ACTIONS");
    println!("{}", "-".repeat(40));
    println!("  1. Normalize headers, drop duplicate columns");
    println!("  2. Coerce fully-numeric text columns");
    println!("  3. Replace infinities, impute missing values ({:?})", args.imputation);
    println!("  4. Derive Health Index, Economic Index, Mortality Pressure");
    println!();

    println!("{}", "=".repeat(80));
    println!("To execute this preparation, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Build the pipeline, wiring progress output unless quiet.
fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Print a human-readable summary of the preparation results.
fn print_human_readable_summary(result: &PrepResult, filtered_rows: usize, args: &Args) {
    let summary = &result.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("PREPARATION COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        args.input, summary.rows, summary.columns_before
    );
    println!(
        "Table:  {} rows x {} columns after cleaning and derivation",
        summary.rows, summary.columns_after
    );
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Duplicate headers dropped: {}",
        summary.duplicate_headers_dropped
    );
    println!("  Columns coerced to numeric: {}", summary.coerced_columns.len());
    println!("  Non-finite values replaced: {}", summary.infinities_replaced);
    println!("  Missing cells imputed: {}", summary.imputed_cells);
    println!();

    println!("Resolved Columns:");
    for (role, header) in &summary.resolved_roles {
        println!("  {:<24} -> {}", role, header);
    }
    println!();

    println!("Derived Indices: {:?}", summary.derived_columns);
    println!();

    if args.year.is_some()
        || args.year_from.is_some()
        || args.year_to.is_some()
        || !args.country.is_empty()
    {
        println!("Selection: {} of {} rows match", filtered_rows, summary.rows);
        if let Some(ref export_path) = args.export {
            println!("Exported:  {}", export_path);
        }
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save a detailed JSON report");
    println!("{}", "=".repeat(80));
}
