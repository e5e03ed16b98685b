//! CLI entry point for the used-car listings analysis.

use anyhow::{Context, Result, anyhow};
use autos_analysis::reporting::{DisplayOptions, ReportFormatter, ReportWriter};
use autos_analysis::{
    AggregateSort, AggregateSortKey, AnalysisConfig, AnalysisOutcome, ColumnDropMode, Pipeline,
};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use std::path::Path;
use tracing::{debug, error, info};

/// CLI-compatible column drop mode
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDropMode {
    /// Report the columns as dropped but keep analysing them
    Advisory,
    /// Remove the columns from the working table
    Remove,
}

impl From<CliDropMode> for ColumnDropMode {
    fn from(cli: CliDropMode) -> Self {
        match cli {
            CliDropMode::Advisory => ColumnDropMode::Advisory,
            CliDropMode::Remove => ColumnDropMode::Remove,
        }
    }
}

/// CLI-compatible brand table ordering
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSortKey {
    /// Mean price, highest first
    MeanPrice,
    /// Mean odometer reading, highest first
    MeanMileage,
    /// Number of listings, highest first
    Listings,
    /// Brand name, alphabetical
    Brand,
}

impl From<CliSortKey> for AggregateSort {
    fn from(cli: CliSortKey) -> Self {
        match cli {
            CliSortKey::MeanPrice => AggregateSort::descending(AggregateSortKey::MeanPrice),
            CliSortKey::MeanMileage => AggregateSort::descending(AggregateSortKey::MeanMileage),
            CliSortKey::Listings => AggregateSort::descending(AggregateSortKey::Listings),
            CliSortKey::Brand => AggregateSort::ascending(AggregateSortKey::Brand),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Used-car listings cleaning and brand analysis",
    long_about = "Loads a used-car listings CSV, normalizes its column names, filters \
                  implausible prices and registration years, and reports descriptive \
                  statistics and brand-level averages.\n\n\
                  EXAMPLES:\n  \
                  # Full text report\n  \
                  autos-analysis -i autos.csv\n\n  \
                  # Top 5 brands ordered by mean price\n  \
                  autos-analysis -i autos.csv --top-brands 5 --sort-by mean-price\n\n  \
                  # Machine-readable output\n  \
                  autos-analysis -i autos.csv --json | jq .brands.aggregates\n\n  \
                  # Save the JSON report next to the text output\n  \
                  autos-analysis -i autos.csv --emit-report -o reports/"
)]
struct Args {
    /// Path to the listings CSV file
    #[arg(short, long)]
    input: String,

    /// Text encoding of the input (WHATWG label, e.g. latin1, utf-8)
    #[arg(long)]
    encoding: Option<String>,

    /// Number of most frequent brands to aggregate
    #[arg(long)]
    top_brands: Option<usize>,

    /// Whether the low-value columns are removed from the working table
    #[arg(long, value_enum)]
    drop_mode: Option<CliDropMode>,

    /// Ordering of the brand aggregate table
    ///
    /// If not specified, brands keep their frequency order
    #[arg(long, value_enum)]
    sort_by: Option<CliSortKey>,

    /// Digits after the decimal point in the text report
    #[arg(long)]
    precision: Option<usize>,

    /// Rows shown per table in the text report (0 shows all)
    #[arg(long, default_value = "20")]
    max_rows: usize,

    /// JSON configuration file; command line options override it
    #[arg(short, long)]
    config: Option<String>,

    /// Output directory for --emit-report
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the report)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of the text report
    ///
    /// Disables all logs; only the report is written.
    #[arg(long)]
    json: bool,

    /// Write the JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the JSON report.
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
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = build_config(&args)?;
    debug!("Effective configuration: {:?}", config);

    let pipeline = build_pipeline(&args, config)?;

    let precision = pipeline.config().float_precision;
    match pipeline.run(&args.input) {
        Ok(outcome) => handle_output(&outcome, &args, precision),
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            error!("Analysis failed: {}", e);
            Err(anyhow!("Analysis failed: {}", e))
        }
    }
}

/// Config file (or defaults) with command line overrides applied.
fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Reading config file {}", path))?;
            info!("Loaded configuration from {}", path);
            AnalysisConfig::from_json(&json)?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(encoding) = &args.encoding {
        config.encoding = encoding.clone();
    }
    if let Some(n) = args.top_brands {
        config.top_brands = n;
    }
    if let Some(mode) = args.drop_mode {
        config.drop_mode = mode.into();
    }
    if let Some(key) = args.sort_by {
        config.aggregate_sort = Some(key.into());
    }
    if let Some(precision) = args.precision {
        config.float_precision = precision;
    }

    config.validate()?;
    Ok(config)
}

fn build_pipeline(args: &Args, config: AnalysisConfig) -> Result<Pipeline> {
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

/// Handle pipeline output based on CLI flags.
///
/// - Default: text report to stdout
/// - `--json`: JSON report to stdout only (no logs)
/// - `--emit-report`: JSON report written to the output directory
fn handle_output(outcome: &AnalysisOutcome, args: &Args, precision: usize) -> Result<()> {
    let report = &outcome.report;

    if args.emit_report {
        let path = ReportWriter::new(&args.output).write(report, Path::new(&args.input))?;
        if !args.json {
            info!("JSON report written to {}", path.display());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let options = DisplayOptions {
        float_precision: precision,
        max_rows: (args.max_rows > 0).then_some(args.max_rows),
    };
    print!("{}", ReportFormatter::render(report, &options));

    Ok(())
}
