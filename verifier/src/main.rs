// Forbid unwrap() in production code to prevent panics from corrupt files.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::path::PathBuf;
use std::process::ExitCode;

use btree_verify::config::DEFAULT_LOG_FILTER;
use btree_verify::{LeafChainCap, Verifier, VerifyConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status when violations were found and `--strict` is set.
const EXIT_VIOLATIONS: u8 = 1;
/// Exit status when the file could not be verified at all.
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(name = "btree-verify")]
#[command(about = "Check the structure of a B+Tree file", version)]
struct Cli {
    /// Path to the tree file
    file: PathBuf,

    /// Most leaves the chain may hold, or `pages` for the page count
    #[arg(long, value_name = "N|pages")]
    leaf_chain_cap: Option<LeafChainCap>,

    /// Also check key order inside internal nodes
    #[arg(long)]
    check_internal_order: bool,

    /// Only print violations and the summary
    #[arg(short, long)]
    quiet: bool,

    /// Exit with status 1 when violations are found
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match VerifyConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    if let Some(cap) = cli.leaf_chain_cap {
        config.leaf_chain_cap = cap;
    }
    config.check_internal_order |= cli.check_internal_order;

    tracing::debug!(
        "Loaded configuration: leaf_chain_cap={}, check_internal_order={}",
        config.leaf_chain_cap,
        config.check_internal_order
    );

    let report = match Verifier::new(config).verify_path(&cli.file) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    print!("{}", report.display(cli.quiet));

    if cli.strict && !report.is_clean() {
        ExitCode::from(EXIT_VIOLATIONS)
    } else {
        ExitCode::SUCCESS
    }
}
