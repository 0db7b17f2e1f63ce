use anyhow::Result;
use rand::Rng;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::domain::{DailyStats, MeasurementRow, MeterSample, SpotUsage};

/// Spots ranked by the number of distinct meters reporting at them.
///
/// Equal counts are ordered by spot id so results are reproducible.
pub async fn top_spots(pool: &SqlitePool, limit: u32) -> Result<Vec<SpotUsage>> {
    let rows = sqlx::query_as::<_, SpotUsage>(
        r#"
        SELECT
            spotID                  AS spot_id,
            COUNT(DISTINCT meterID) AS meter_count
        FROM data
        GROUP BY spotID
        ORDER BY meter_count DESC, spot_id ASC
        LIMIT ?
        "#,
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Every meter present in the data with its number of measurements, ordered by meter id.
pub async fn meter_samples(pool: &SqlitePool) -> Result<Vec<MeterSample>> {
    let rows = sqlx::query_as::<_, MeterSample>(
        r#"
        SELECT
            meterID  AS meter_id,
            COUNT(*) AS measurement_count
        FROM data
        GROUP BY meterID
        ORDER BY meterID
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Pick `count` distinct meters uniformly at random.
///
/// Returns every meter when fewer than `count` exist. The draw happens
/// client side so a seeded `rng` gives the same sample for the same data.
pub async fn random_meters<R>(pool: &SqlitePool, rng: &mut R, count: usize) -> Result<Vec<MeterSample>>
where
    R: Rng + ?Sized,
{
    let mut all = meter_samples(pool).await?;
    let amount = count.min(all.len());

    let mut picked: Vec<usize> = rand::seq::index::sample(rng, all.len(), amount).into_vec();
    // Take from the back so earlier indices stay valid.
    picked.sort_unstable_by(|a, b| b.cmp(a));
    let mut sample: Vec<MeterSample> = picked.into_iter().map(|i| all.swap_remove(i)).collect();
    sample.reverse();

    Ok(sample)
}

/// Per-day aggregates for the given meters, grouped by date, spot and type.
pub async fn daily_stats(pool: &SqlitePool, meter_ids: &[String]) -> Result<Vec<DailyStats>> {
    if meter_ids.is_empty() {
        return Ok(Vec::new());
    }

    // A plain IN list is fine for the sample sizes used here (well under
    // SQLite's bind limit); larger sets would go through a temp table.
    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT
            date,
            spotID                  AS spot_id,
            "type"                  AS kind,
            unit,
            COUNT(DISTINCT meterID) AS meter_count,
            TOTAL(value)            AS day_total,
            AVG(value)              AS day_avg
        FROM data
        WHERE meterID IN ("#,
    );
    let mut ids = builder.separated(", ");
    for id in meter_ids {
        ids.push_bind(id.as_str());
    }
    builder.push(
        r#")
        GROUP BY date, spotID, "type"
        ORDER BY date, spotID, "type"
        "#,
    );

    let rows = builder
        .build_query_as::<DailyStats>()
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Fetch the date-ordered measurements of a single meter.
pub async fn load_profile(pool: &SqlitePool, meter_id: &str) -> Result<Vec<MeasurementRow>> {
    let rows = sqlx::query_as::<_, MeasurementRow>(
        r#"
        SELECT
            id,
            meterID AS meter_id,
            date,
            value,
            unit,
            "type"  AS kind,
            spotID  AS spot_id
        FROM data
        WHERE meterID = ?
        ORDER BY date
        "#,
    )
    .bind(meter_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_measurements(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM data")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
