//! CLI for comparing US GAAP metrics across companies.
//!
//! This binary loads company facts documents from the catalog, lists the
//! metrics every selected company reports, and prints one metric aligned by
//! period end date as a table, CSV, or Vega-Lite chart specification.

use clap::{Args, Parser, Subcommand, ValueEnum};
use facts::{
    ChartKind, CompanyCatalog, CompareConfig, Comparer, Comparison, ComparisonView,
    DescriptionSource, FactsError, HttpFactSource, NO_COMMON_METRIC_MESSAGE, PeriodType, Result,
    Selection,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Most companies compared at once.
const MAX_COMPANIES: usize = 4;

/// User agent sent when none is configured.
const DEFAULT_USER_AGENT: &str = "gaap-compare/0.1 (gaap-compare@example.com)";

#[derive(Parser)]
#[command(name = "gaap-compare")]
#[command(about = "Compare US GAAP metrics across companies", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON company catalog to use instead of the built-in one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// User agent for HTTP requests
    #[arg(long, global = true, env = "GAAP_COMPARE_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog companies
    Companies,
    /// List metrics reported by every selected company
    Metrics {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Show the description of a metric
    Describe {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Metric identifier, e.g. Revenues
        #[arg(long)]
        metric: String,
    },
    /// Compare a metric across the selected companies
    Compare {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Metric identifier, e.g. Revenues
        #[arg(long)]
        metric: String,
        /// Unit code
        #[arg(long, default_value = "USD")]
        unit: String,
        /// Restrict to annual (10-K) or quarterly (10-Q) filings
        #[arg(long)]
        period: Option<PeriodType>,
        /// Chart kind for the vega output
        #[arg(long, default_value_t = ChartKind::Line)]
        chart: ChartKind,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Company whose description is shown
        #[arg(long)]
        description_from: Option<String>,
    },
}

#[derive(Args)]
struct SelectionArgs {
    /// Company to include (1 to 4, repeatable)
    #[arg(short = 'c', long = "company", required = true)]
    companies: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned table
    Table,
    /// Aligned table as CSV
    Csv,
    /// Vega-Lite chart specification
    Vega,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Installs the stderr subscriber, honouring `RUST_LOG` when set.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let catalog = match &cli.catalog {
        Some(path) => CompanyCatalog::from_json_file(path)?,
        None => CompanyCatalog::builtin(),
    };

    if let Commands::Companies = cli.command {
        list_companies(&catalog);
        return Ok(ExitCode::SUCCESS);
    }

    let source = HttpFactSource::with_timeout(
        &cli.user_agent,
        Duration::from_secs(cli.timeout_secs),
    )?;
    let comparer = Comparer::new(Arc::new(source), catalog);

    match cli.command {
        Commands::Companies => Ok(ExitCode::SUCCESS),
        Commands::Metrics { selection } => {
            let selection = load(&comparer, &selection).await?;
            list_metrics(&selection);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Describe { selection, metric } => {
            let selection = load(&comparer, &selection).await?;
            if !selection.is_common(&metric) {
                eprintln!("Metric {} is not reported by every selected company.", metric);
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", selection.description(&metric));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Compare {
            selection,
            metric,
            unit,
            period,
            chart,
            format,
            description_from,
        } => {
            let mut config = CompareConfig::new().with_unit(unit).with_chart(chart);
            if let Some(period) = period {
                config = config.with_period(period);
            }
            if let Some(name) = description_from {
                config = config.with_description_source(DescriptionSource::Company(name));
            }

            let comparer = comparer.with_config(config);
            let selection = load(&comparer, &selection).await?;
            print_comparison(&selection.compare(&metric)?, format)
        }
    }
}

/// Checks the selection size and rejects repeated names.
fn validate_selection(companies: &[String]) -> Result<()> {
    if companies.is_empty() || companies.len() > MAX_COMPANIES {
        return Err(FactsError::InvalidParameter(format!(
            "Select between 1 and {} companies, got {}",
            MAX_COMPANIES,
            companies.len()
        )));
    }

    let mut seen = HashSet::new();
    for name in companies {
        if !seen.insert(name.as_str()) {
            return Err(FactsError::InvalidParameter(format!(
                "Company selected more than once: {}",
                name
            )));
        }
    }
    Ok(())
}

async fn load(comparer: &Comparer, args: &SelectionArgs) -> Result<Selection> {
    validate_selection(&args.companies)?;
    debug!(companies = ?args.companies, "Loading selection");
    let selection = comparer.load(args.companies.as_slice()).await?;

    for (name, reason) in selection.failures() {
        eprintln!("Skipping {}: {}", name, reason);
    }
    Ok(selection)
}

fn list_companies(catalog: &CompanyCatalog) {
    println!("Companies ({} total)\n", catalog.len());
    for entry in catalog.iter() {
        println!("  {} - {}", entry.name, entry.location.resolve());
    }
}

fn list_metrics(selection: &Selection) {
    let metrics = selection.common_metrics();
    if metrics.is_empty() {
        println!("{}", NO_COMMON_METRIC_MESSAGE);
        return;
    }

    println!("Common metrics ({} total)\n", metrics.len());
    for metric in metrics {
        println!("  {}", metric);
    }
}

fn print_comparison(comparison: &Comparison, format: OutputFormat) -> Result<ExitCode> {
    match comparison {
        Comparison::Ready(view) => {
            print_view(view, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Comparison::MetricNotCommon { .. } => {
            eprintln!("{}", comparison.message().unwrap_or_default());
            Ok(ExitCode::FAILURE)
        }
        Comparison::NoComparableData { description, .. } => {
            println!("{}\n", description);
            println!("{}", comparison.message().unwrap_or_default());
            Ok(ExitCode::SUCCESS)
        }
        Comparison::NoCompanies | Comparison::NoCommonMetric => {
            println!("{}", comparison.message().unwrap_or_default());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_view(view: &ComparisonView, format: OutputFormat) -> Result<()> {
    for company in view.table.skipped() {
        eprintln!("No {} data in {} for {}", view.metric, view.config.unit, company);
    }

    let chart = view.chart();
    match format {
        OutputFormat::Table => {
            println!("{}\n", chart.title);
            println!("{}\n", view.description);
            println!("{}", view.table.frame());
        }
        OutputFormat::Csv => {
            eprintln!("{}", view.description);
            print!("{}", chart.to_csv()?);
        }
        OutputFormat::Vega => {
            eprintln!("{}", view.description);
            let spec = serde_json::to_string_pretty(&chart.to_vega_lite())
                .map_err(|e| FactsError::Other(e.to_string()))?;
            println!("{}", spec);
        }
    }
    Ok(())
}
