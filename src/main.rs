//! OLIST WHAT-IF: command line entry point.
//!
//! Loads configuration, initialises structured logging, then either builds
//! the seller table from a marketplace snapshot, runs the what-if analysis
//! on an existing seller table, or does both in one go.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use olist_whatif::analysis::{WhatIfAnalysis, WhatIfReport};
use olist_whatif::config::AppConfig;
use olist_whatif::data::SellerFeatures;
use olist_whatif::storage;
use olist_whatif::types::SellerEconomics;

#[derive(Parser)]
#[command(name = "olist-whatif", version, about = "Seller removal what-if analysis")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the seller table from a marketplace snapshot.
    Features {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run the what-if analysis on a seller table.
    Analyze {
        #[arg(long)]
        sellers: PathBuf,
        /// Overrides `output.report_path`.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Build the seller table and analyse it.
    Run {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cli = Cli::parse();
    let cfg = AppConfig::load_or_default(&cli.config)?;
    info!(
        config = %cli.config,
        alpha = cfg.analysis.alpha,
        beta = cfg.analysis.beta,
        "OLIST WHAT-IF starting up"
    );

    match cli.cmd {
        Command::Features { dataset, out } => {
            let data = storage::load_dataset(&dataset)?;
            let rows = SellerFeatures::new(&data, cfg.fee_schedule()).training_data();
            storage::save_seller_table(&rows, &out)?;
        }
        Command::Analyze { sellers, report } => {
            let rows = storage::load_seller_table(&sellers)?;
            analyse(&cfg, &rows, report.as_deref())?;
        }
        Command::Run { dataset, report } => {
            let data = storage::load_dataset(&dataset)?;
            let rows = SellerFeatures::new(&data, cfg.fee_schedule()).training_data();
            analyse(&cfg, &rows, report.as_deref())?;
        }
    }

    Ok(())
}

fn analyse<S: SellerEconomics>(cfg: &AppConfig, sellers: &[S], report_path: Option<&Path>) -> Result<()> {
    let analysis = WhatIfAnalysis::new(cfg.whatif_config());
    let result = analysis.perform_analysis(sellers)?;
    let report = WhatIfReport::new(*analysis.config(), result);

    info!("{report}");
    if let Some(best) = report.optimum {
        info!(
            total_sellers = report.total_sellers,
            keep = best.n_sellers_remaining,
            remove = report.sellers_removed,
            net_profit = %format!("${:.2}", best.net_profit),
            uplift = %format!("${:.2}", report.profit_uplift),
            "Optimal seller base"
        );
    }

    let path = report_path.unwrap_or_else(|| Path::new(&cfg.output.report_path));
    storage::save_report(&report, path)
}

/// Initialise the tracing subscriber with env-filter support.
///
/// Set `RUST_LOG` to control verbosity, e.g. `RUST_LOG=olist_whatif=debug`
/// to see every elimination step. Set `OLIST_LOG_JSON=1` for JSON output.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("olist_whatif=info"));

    if std::env::var("OLIST_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
