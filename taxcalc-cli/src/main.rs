//! taxcalc CLI - operational tooling for the tax calculator database topology
//!
//! Provides:
//! - Topology health checks against the configured primary and replicas (`check`)
//! - Reader election dry runs (`elect`)
//! - Config file validation without connecting (`config validate`)

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

use config::TaxcalcConfig;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "taxcalc",
    author,
    version,
    about = "Database topology tooling for the tax calculator service",
    long_about = "Open the configured primary and read replicas, report their health, \
                  and show which replica reads would be routed to."
)]
struct Cli {
    /// Path to the topology config file
    #[arg(
        long,
        short = 'c',
        global = true,
        env = "TAXCALC_CONFIG",
        value_name = "PATH",
        default_value = "taxcalc.toml"
    )]
    config: PathBuf,

    /// Enable debug logging and per-statement tracing on every endpoint
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the topology and print per-endpoint status
    Check,
    /// Run reader elections and print the chosen endpoint per round
    Elect(commands::elect::ElectArgs),
    /// Inspect and validate the config file (validate, path)
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Check => commands::run_check(&load_config(&cli.config, cli.debug)?).await?,
        Commands::Elect(args) => {
            commands::run_elect(args, &load_config(&cli.config, cli.debug)?).await?
        }
        Commands::Config(args) => config::run_config(args, &cli.config)?,
    }
    Ok(())
}

fn load_config(path: &Path, debug: bool) -> Result<TaxcalcConfig> {
    let mut config = TaxcalcConfig::load(path)?;
    if debug {
        config.enable_debug();
    }
    Ok(config)
}
