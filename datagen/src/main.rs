use std::process::ExitCode;

use anyhow::Result;
use datagen::{config::AppConfig, metrics_server, observability, workflow};
use meter_client::db;

#[tokio::main]
async fn main() -> ExitCode {
    observability::init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let pool = db::connect(&cfg.database.uri, cfg.database.max_connections).await?;
    let mut rng = workflow::rng_from_seed(cfg.generation.seed);

    workflow::run(&pool, &cfg, &mut rng).await?;

    pool.close().await;
    Ok(())
}
