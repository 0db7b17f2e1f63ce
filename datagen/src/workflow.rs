//! The end-to-end run: migrate, generate and load the dataset, then query it.

use std::{future::Future, sync::Arc, time::Instant};

use anyhow::Result;
use meter_client::{
    db,
    domain::{DailyStats, Measurement, MeterSample, SpotUsage},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sqlx::SqlitePool;

use crate::{
    config::{AppConfig, GenerationConfig, QueryConfig},
    generate::{build_topology, generate_ids, MeasurementSource, Topology},
    pipeline::Pipeline,
    sinks::SqliteMeasurementSink,
    transform::MeasurementValidation,
};

/// What a generation run produced, kept in memory for inspection.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub spots: Vec<String>,
    pub topology: Topology,
    pub rows: i64,
}

#[derive(Debug, Clone, Default)]
pub struct QueryReport {
    pub top_spots: Vec<SpotUsage>,
    pub sample: Vec<MeterSample>,
    pub stats: Vec<DailyStats>,
}

/// Generate a fresh dataset and atomically replace the `data` table with it.
pub async fn generate_dataset<R: Rng>(
    pool: &SqlitePool,
    cfg: &GenerationConfig,
    rng: &mut R,
) -> Result<Dataset> {
    let spots = generate_ids(rng, cfg.spots);
    let meter_ids = generate_ids(rng, cfg.meters);
    let topology = build_topology(rng, &spots, meter_ids)?;

    let value_rng = StdRng::seed_from_u64(rng.random());
    let source = MeasurementSource::starting_in_year(topology.clone(), cfg.start_year, cfg.days(), value_rng)?;
    tracing::info!(
        meters = source.meter_count(),
        spots = spots.len(),
        days = source.days(),
        start = %source.start(),
        expected_rows = source.expected_rows(),
        "generating measurements"
    );

    let validation = MeasurementValidation::new(source.start(), source.end());
    let pipeline: Pipeline<_, Measurement, _> = Pipeline {
        source,
        transforms: vec![Arc::new(validation)],
        sink: SqliteMeasurementSink::new(pool.clone(), cfg.batch_size, cfg.progress_every),
    };
    pipeline.run().await?;

    let rows = db::count_measurements(pool).await?;
    tracing::info!(rows, "data generated successfully");

    Ok(Dataset {
        spots,
        topology,
        rows,
    })
}

/// Run the three read-only queries against whatever data is committed.
pub async fn run_queries<R: Rng>(pool: &SqlitePool, cfg: &QueryConfig, rng: &mut R) -> Result<QueryReport> {
    let top_spots = timed("get_meter_most_used", db::top_spots(pool, cfg.top_spots_limit)).await?;
    for spot in &top_spots {
        tracing::info!(spot_id = %spot.spot_id, meters = spot.meter_count, "spot usage");
    }

    let sample = timed("get_random_meters", db::random_meters(pool, rng, cfg.sample_size)).await?;
    tracing::info!(meters = sample.len(), "sampled meters");
    for meter in &sample {
        tracing::debug!(meter_id = %meter.meter_id, measurements = meter.measurement_count, "sampled meter");
    }

    let meter_ids: Vec<String> = sample.iter().map(|m| m.meter_id.clone()).collect();
    let stats = timed("generate_stats", db::daily_stats(pool, &meter_ids)).await?;
    tracing::info!(groups = stats.len(), "daily statistics computed");
    for row in &stats {
        tracing::debug!(
            date = %row.date,
            spot_id = %row.spot_id,
            kind = %row.kind,
            nb_meter = row.meter_count,
            day_total = row.day_total,
            day_avg = row.day_avg,
            unit = %row.unit,
            "daily stats"
        );
    }

    Ok(QueryReport {
        top_spots,
        sample,
        stats,
    })
}

/// Apply migrations, regenerate the dataset and report on it.
pub async fn run<R: Rng>(pool: &SqlitePool, cfg: &AppConfig, rng: &mut R) -> Result<(Dataset, QueryReport)> {
    db::migrate(pool).await?;

    let dataset = timed("generate_data", generate_dataset(pool, &cfg.generation, rng)).await?;
    let report = run_queries(pool, &cfg.queries, rng).await?;

    Ok((dataset, report))
}

/// Random source for a run: seeded when configured, otherwise from the OS.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

async fn timed<F, T>(step: &'static str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    let out = fut.await;
    tracing::info!(step, elapsed_ms = started.elapsed().as_millis() as u64, "step finished");
    out
}
