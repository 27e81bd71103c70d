//! contract-summaries - build the contract spending summary CSV exports.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use contract_summaries::aggregation::{AggregationSpec, Dimension, Measure};
use contract_summaries::{pipeline, SummaryConfig, SummaryType};
use polars::prelude::{CsvWriter, SerWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// contract-summaries - proactive disclosure contract summaries
#[derive(Parser, Debug)]
#[command(name = "contract-summaries")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "contract-summaries.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every summary export
    Run {
        /// Log destinations instead of writing files
        #[arg(long)]
        dry_run: bool,

        /// Remove existing vendor/department/category/overall folders first
        #[arg(long)]
        clean: bool,

        /// Output root, overriding paths.output
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the included vendor set, one name per line
    IncludedVendors,

    /// Run a single aggregation and print it as CSV
    Aggregate {
        /// Grouping dimension (vendor, owner_org, category, it_subcategory); up to two
        #[arg(long = "by")]
        dimensions: Vec<String>,

        /// Scope to one entity, as DIMENSION=VALUE
        #[arg(long)]
        entity: Option<String>,

        /// Group by fiscal year as well
        #[arg(long)]
        fiscal_year: bool,

        /// Restrict to the included vendor set
        #[arg(long)]
        included_vendors: bool,

        /// Output shape (totals, ranking, distribution, counts)
        #[arg(long, default_value = "totals")]
        measure: String,

        /// Summary type (core, dnd, all); defaults to run.summary_type
        #[arg(long)]
        summary_type: Option<String>,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn parse_dimension(name: &str) -> Result<Dimension> {
    Dimension::from_name(name).with_context(|| {
        format!("unknown dimension '{name}', expected vendor, owner_org, category or it_subcategory")
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    let mut config = SummaryConfig::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;

    match cli.command {
        Commands::Run {
            dry_run,
            clean,
            output,
        } => {
            if dry_run {
                config.run.update_summary_csv_files = false;
            }
            if clean {
                config.run.remove_existing_summary_folders = true;
            }
            if let Some(output) = output {
                config.paths.output = output;
            }
            let report = pipeline::run(&config).context("summary run failed")?;
            println!("{report}");
        }
        Commands::IncludedVendors => {
            let engine = pipeline::load_engine(&config)?;
            for vendor in engine.included_vendors().names() {
                println!("{vendor}");
            }
        }
        Commands::Aggregate {
            dimensions,
            entity,
            fiscal_year,
            included_vendors,
            measure,
            summary_type,
        } => {
            let summary_type =
                SummaryType::from_tag(summary_type.as_deref().unwrap_or(&config.run.summary_type));
            let Some(measure) = Measure::from_name(&measure) else {
                bail!("unknown measure '{measure}', expected totals, ranking, distribution or counts");
            };

            let mut spec = AggregationSpec::new(summary_type).measure(measure);
            for name in &dimensions {
                spec = spec.by(parse_dimension(name)?);
            }
            if let Some(entity) = entity {
                let Some((dimension, value)) = entity.split_once('=') else {
                    bail!("--entity expects DIMENSION=VALUE, got '{entity}'");
                };
                spec = spec.for_entity(parse_dimension(dimension)?, value);
            }
            if fiscal_year {
                spec = spec.per_fiscal_year();
            }
            if included_vendors {
                spec = spec.included_vendors_only();
            }

            let engine = pipeline::load_engine(&config)?;
            let table = engine.aggregate(&spec)?;
            let mut df = table.to_export_frame(engine.precision())?;
            CsvWriter::new(io::stdout().lock())
                .include_header(true)
                .finish(&mut df)
                .context("failed to write csv to stdout")?;
        }
    }

    Ok(())
}
