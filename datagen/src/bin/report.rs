//! Query an existing dataset without regenerating it.

use std::process::ExitCode;

use anyhow::Result;
use datagen::{config::AppConfig, observability, workflow};
use meter_client::db;

#[tokio::main]
async fn main() -> ExitCode {
    observability::init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "report failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = AppConfig::load()?;

    let pool = db::connect(&cfg.database.uri, cfg.database.max_connections).await?;
    db::migrate(&pool).await?;

    let rows = db::count_measurements(&pool).await?;
    tracing::info!(rows, uri = %cfg.database.uri, "querying existing measurements");

    let mut rng = workflow::rng_from_seed(cfg.generation.seed);
    workflow::run_queries(&pool, &cfg.queries, &mut rng).await?;

    pool.close().await;
    Ok(())
}
