//! CLI entry point for covid_metrics.
//!
//! Loads per-country time series, computes normalized metrics and exposes
//! rankings, single-country views and the dashboard datasets.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use covid_metrics::analyzers::analyzer::analyze;
use covid_metrics::analyzers::catalog::{BuildReport, RankBy};
use covid_metrics::charts::Dashboard;
use covid_metrics::config::Config;
use covid_metrics::infra::source_for;
use covid_metrics::output::{print_json, ranking_rows, write_json, write_ranking_csv};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "covid_metrics")]
#[command(about = "Population-normalized Covid-19 metrics per country", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// Path to file or URL to load raw data from (overrides the config)
    #[arg(short, long, global = true, value_name = "FILE_OR_URL")]
    source: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank countries by one of the derived metrics
    Rank {
        /// Metric to order by
        #[arg(short, long, value_enum, default_value_t = Metric::Progress)]
        by: Metric,

        /// Comma-separated country keys (defaults to the configured list)
        #[arg(long, value_delimiter = ',')]
        countries: Vec<String>,

        /// Rank every computed country instead of a selection
        #[arg(long, default_value_t = false, conflicts_with = "countries")]
        all: bool,

        /// Optional CSV file to export the ranking to
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show the computed metrics of a single country
    Show {
        /// Country key, e.g. CZE
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Build all dashboard chart datasets and write them as JSON
    Dashboard {
        #[arg(short, long, default_value = "dashboard.json")]
        output: PathBuf,
    },
    /// List countries that were left out and why
    Exclusions,
}

#[derive(Clone, Copy, ValueEnum)]
enum Metric {
    /// Latest rolling cumulative incidence
    Incidence,
    /// Median day-over-day progress in percent
    Progress,
    /// Sum of the rolling cumulative incidence
    Sum,
}

impl From<Metric> for RankBy {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Incidence => RankBy::CumulativeIncidenceLatest,
            Metric::Progress => RankBy::ProgressScore,
            Metric::Sum => RankBy::CumulativeSum,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/covid_metrics.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("covid_metrics.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?.with_env();
    if let Some(source) = cli.source {
        config.data_url = source;
    }
    config.validate()?;

    let source = source_for(&config.data_url)?;
    let BuildReport { catalog, excluded } = analyze(source.as_ref(), config.metrics_params()).await?;

    match cli.command {
        Commands::Rank {
            by,
            countries,
            all,
            csv,
        } => {
            let subset: Option<BTreeSet<String>> = if all {
                None
            } else if countries.is_empty() {
                Some(config.countries.iter().cloned().collect())
            } else {
                Some(countries.iter().map(|k| k.trim().to_uppercase()).collect())
            };

            let ranked = catalog.rank(by.into(), subset.as_ref());
            let rows = ranking_rows(&catalog, &ranked);

            for row in &rows {
                info!(
                    rank = row.rank,
                    country = %row.key,
                    name = %row.name,
                    value = row.value,
                    "Ranked"
                );
            }

            if let Some(path) = csv {
                write_ranking_csv(&path, &rows)?;
                info!(path = %path.display(), rows = rows.len(), "Ranking exported");
            }
        }
        Commands::Show { key } => {
            let entry = catalog
                .lookup(&key.to_uppercase())
                .with_context(|| format!("cannot show '{key}'"))?;
            print_json(entry)?;
        }
        Commands::Dashboard { output } => {
            let dashboard = Dashboard::build(&catalog, &config, Local::now())?;
            write_json(&output, &dashboard)?;
            info!(path = %output.display(), "Dashboard written");
        }
        Commands::Exclusions => {
            for e in &excluded {
                if e.reason.is_warning() {
                    warn!(country = %e.key, name = %e.name, reason = %e.reason, "Skipped");
                } else {
                    warn!(country = %e.key, name = %e.name, error = %e.reason, "Failed");
                }
            }
            info!(total = excluded.len(), "Exclusions listed");
        }
    }

    Ok(())
}
