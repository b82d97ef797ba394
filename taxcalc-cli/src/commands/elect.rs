//! Run reader elections and show where each one lands

use anyhow::{Context, Result};
use clap::Parser;
use taxcalc_db::Sql;

use crate::config::TaxcalcConfig;

#[derive(Parser, Debug)]
pub struct ElectArgs {
    /// Number of elections to run
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub rounds: u32,
}

pub async fn run_elect(args: ElectArgs, config: &TaxcalcConfig) -> Result<()> {
    let sql = Sql::open(&config.database)
        .await
        .context("Failed to open primary connection")?;

    for round in 1..=args.rounds {
        let reader = sql.reader().await;
        println!("round {round}: {} {}", reader.role(), reader.target());
    }

    sql.close().await.context("Failed to close connections")?;
    Ok(())
}
