use std::collections::{HashMap, HashSet};

use datagen::{
    config::{AppConfig, GenerationConfig, QueryConfig},
    pipeline::{Envelope, PipelineError, Sink},
    sinks::SqliteMeasurementSink,
    workflow::{generate_dataset, run, run_queries},
};
use futures::stream;
use meter_client::{
    db,
    domain::{Measurement, MeterKind, UNIT_WH},
};
use rand::{rngs::StdRng, SeedableRng};
use sqlx::SqlitePool;
use time::macros::date;

async fn memory_pool() -> SqlitePool {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::migrate(&pool).await.unwrap();
    pool
}

fn small_generation(meters: usize, spots: usize, years: u32) -> GenerationConfig {
    GenerationConfig {
        meters,
        spots,
        years,
        batch_size: 97,
        progress_every: 2,
        ..GenerationConfig::default()
    }
}

#[tokio::test]
async fn ten_meters_three_spots_one_year() {
    let pool = memory_pool().await;
    let mut rng = StdRng::seed_from_u64(2021);

    let dataset = generate_dataset(&pool, &small_generation(10, 3, 1), &mut rng)
        .await
        .unwrap();
    assert_eq!(dataset.rows, 3_650);
    assert_eq!(db::count_measurements(&pool).await.unwrap(), 3_650);

    let (min, max): (String, String) = sqlx::query_as("SELECT MIN(date), MAX(date) FROM data")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(min, "2021-01-01");
    assert_eq!(max, "2021-12-31");

    let top = db::top_spots(&pool, 100).await.unwrap();
    assert!(!top.is_empty() && top.len() <= 3);
    assert_eq!(top.iter().map(|s| s.meter_count).sum::<i64>(), 10);
    assert!(top.windows(2).all(|w| w[0].meter_count >= w[1].meter_count));

    let spots: HashSet<&String> = dataset.spots.iter().collect();
    assert!(top.iter().all(|s| spots.contains(&s.spot_id)));
}

#[tokio::test]
async fn every_meter_has_a_complete_consistent_profile() {
    let pool = memory_pool().await;
    let mut rng = StdRng::seed_from_u64(5);

    let dataset = generate_dataset(&pool, &small_generation(6, 4, 2), &mut rng)
        .await
        .unwrap();

    for meter in dataset.topology.iter() {
        let profile = db::load_profile(&pool, &meter.meter_id).await.unwrap();
        assert_eq!(profile.len(), 730);
        assert_eq!(profile[0].date, date!(2021 - 01 - 01));
        for pair in profile.windows(2) {
            assert_eq!(pair[0].date.next_day(), Some(pair[1].date));
        }
        for row in &profile {
            assert_eq!(row.spot_id, meter.spot_id);
            assert_eq!(row.kind, meter.kind);
            assert_eq!(row.unit, UNIT_WH);
            assert!((0.0..=9_999.0).contains(&row.value));
            assert_eq!(row.value.fract(), 0.0);
        }
    }
}

#[tokio::test]
async fn regenerating_replaces_previous_rows() {
    let pool = memory_pool().await;
    let mut rng = StdRng::seed_from_u64(77);

    let first = generate_dataset(&pool, &small_generation(5, 2, 1), &mut rng)
        .await
        .unwrap();
    let second = generate_dataset(&pool, &small_generation(3, 2, 1), &mut rng)
        .await
        .unwrap();

    assert_eq!(second.rows, 3 * 365);
    let present: HashSet<String> = db::meter_samples(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.meter_id)
        .collect();
    let expected: HashSet<String> = second.topology.iter().map(|m| m.meter_id.clone()).collect();
    assert_eq!(present, expected);
    assert!(first.topology.iter().all(|m| !present.contains(&m.meter_id)));
}

#[tokio::test]
async fn failed_load_keeps_previous_dataset() {
    let pool = memory_pool().await;
    let mut rng = StdRng::seed_from_u64(3);
    generate_dataset(&pool, &small_generation(4, 2, 1), &mut rng)
        .await
        .unwrap();

    let record = |day| {
        Ok(Envelope {
            payload: Measurement {
                meter_id: "doomed".to_string(),
                date: day,
                value: 1,
                unit: UNIT_WH,
                kind: MeterKind::Gas,
                spot_id: "s".to_string(),
            },
            meter_index: 0,
        })
    };
    let items = vec![
        record(date!(2021 - 01 - 01)),
        record(date!(2021 - 01 - 02)),
        Err(PipelineError::Source("generator exploded".to_string())),
        record(date!(2021 - 01 - 03)),
    ];

    let sink = SqliteMeasurementSink::new(pool.clone(), 1, 100);
    let res = sink.run(stream::iter(items)).await;
    assert!(matches!(res, Err(PipelineError::Source(_))));

    assert_eq!(db::count_measurements(&pool).await.unwrap(), 4 * 365);
    assert!(db::load_profile(&pool, "doomed").await.unwrap().is_empty());
}

#[tokio::test]
async fn sink_reports_committed_rows() {
    let pool = memory_pool().await;
    let items: Vec<Result<Envelope<Measurement>, PipelineError>> = (0..3)
        .map(|meter_index| {
            Ok(Envelope {
                payload: Measurement {
                    meter_id: format!("m{meter_index}"),
                    date: date!(2021 - 06 - 01),
                    value: 10,
                    unit: UNIT_WH,
                    kind: MeterKind::Elec,
                    spot_id: "s".to_string(),
                },
                meter_index,
            })
        })
        .collect();

    let sink = SqliteMeasurementSink::new(pool.clone(), 2, 1);
    let stats = sink.load(stream::iter(items)).await.unwrap();
    assert_eq!(stats.inserted, 3);
    assert_eq!(stats.deleted, 0);
    assert_eq!(stats.meters, 3);
}

#[tokio::test]
async fn queries_over_generated_data() {
    let pool = memory_pool().await;
    let mut rng = StdRng::seed_from_u64(11);
    generate_dataset(&pool, &small_generation(20, 5, 1), &mut rng)
        .await
        .unwrap();

    let cfg = QueryConfig {
        top_spots_limit: 100,
        sample_size: 8,
    };
    let report = run_queries(&pool, &cfg, &mut rng).await.unwrap();

    assert!(report.top_spots.len() <= 5);
    assert_eq!(report.sample.len(), 8);
    let sampled: HashSet<&String> = report.sample.iter().map(|m| &m.meter_id).collect();
    assert_eq!(sampled.len(), 8);
    assert!(report.sample.iter().all(|m| m.measurement_count == 365));

    // Every (date, spot, type) group is unique and its meter count adds up to the sample.
    let mut per_day: HashMap<String, i64> = HashMap::new();
    for row in &report.stats {
        *per_day.entry(row.date.to_string()).or_default() += row.meter_count;
        assert!(row.meter_count as usize <= sampled.len());
        assert!((row.day_avg * row.meter_count as f64 - row.day_total).abs() < 1e-6);
    }
    assert_eq!(per_day.len(), 365);
    assert!(per_day.values().all(|count| *count == 8));

    let oversized = QueryConfig {
        top_spots_limit: 100,
        sample_size: 1_000,
    };
    let all = run_queries(&pool, &oversized, &mut rng).await.unwrap();
    assert_eq!(all.sample.len(), 20);
}

#[tokio::test]
async fn full_run_applies_migrations_on_a_fresh_database() {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    let mut cfg = AppConfig::default();
    cfg.generation = small_generation(3, 2, 1);
    cfg.queries.sample_size = 2;

    let mut rng = StdRng::seed_from_u64(1);
    let (dataset, report) = run(&pool, &cfg, &mut rng).await.unwrap();

    assert_eq!(dataset.rows, 3 * 365);
    assert_eq!(report.sample.len(), 2);
    assert!(!report.stats.is_empty());
}
