//! Open the configured topology and report on every endpoint

use anyhow::{Context, Result};
use taxcalc_db::Sql;
use tracing::info;

use crate::config::TaxcalcConfig;

pub async fn run_check(config: &TaxcalcConfig) -> Result<()> {
    let topology = &config.database;
    let sql = Sql::open(topology)
        .await
        .context("Failed to open primary connection")?;

    // One election so health reflects a live probe rather than open-time state
    let reader = sql.reader().await;
    info!(db = %reader.target(), role = %reader.role(), "reader elected");

    println!("primary    {}  ok", sql.primary().target());

    let statuses = sql.secondary_health().await;
    for status in &statuses {
        let health = if status.healthy { "healthy" } else { "unhealthy" };
        println!(
            "secondary  {}  {}  hits={}",
            status.target, health, status.hits
        );
    }

    let configured = topology.secondaries.len();
    if statuses.len() < configured {
        println!(
            "⚠️  {} of {} secondaries failed to open",
            configured - statuses.len(),
            configured
        );
    }

    println!("reads      {} ({})", reader.target(), reader.role());

    sql.close().await.context("Failed to close connections")?;
    Ok(())
}
