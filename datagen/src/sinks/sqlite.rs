use std::time::Instant;

use futures::StreamExt;
use meter_client::domain::Measurement;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, QueryBuilder};

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Bound parameters per inserted row.
const BINDS_PER_ROW: usize = 6;

/// Largest batch that stays under SQLite's default limit of 32766 bound parameters.
pub const MAX_BATCH_ROWS: usize = 32_766 / BINDS_PER_ROW;

/// Replaces the whole `data` table with the incoming measurements.
///
/// Everything happens in one transaction: the old rows are deleted, the new
/// ones inserted in multi-row batches, and the result committed only once the
/// input is exhausted. Any error drops the transaction, which rolls it back.
pub struct SqliteMeasurementSink {
    pool: SqlitePool,
    batch_size: usize,
    progress_every: usize,
}

/// Summary of a committed load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub deleted: u64,
    pub inserted: u64,
    pub meters: usize,
}

impl SqliteMeasurementSink {
    pub fn new(pool: SqlitePool, batch_size: usize, progress_every: usize) -> Self {
        Self {
            pool,
            batch_size: batch_size.clamp(1, MAX_BATCH_ROWS),
            progress_every: progress_every.max(1),
        }
    }

    /// Run the load and report what was committed.
    pub async fn load<S>(&self, mut input: S) -> Result<LoadStats, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<Measurement>, PipelineError>> + Send + Unpin,
    {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM data").execute(&mut *tx).await?.rows_affected();
        tracing::info!(deleted_rows = deleted, "cleared previous measurements");

        let mut stats = LoadStats {
            deleted,
            ..LoadStats::default()
        };
        let mut progress = Progress::new(self.progress_every);
        let mut buffer: Vec<Envelope<Measurement>> = Vec::with_capacity(self.batch_size);

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) => {
                    tracing::error!(error = %e, "upstream pipeline failed, rolling back measurement load");
                    return Err(e);
                }
            };

            let seen = stats.inserted + buffer.len() as u64;
            if let Some(meter) = progress.observe(env.meter_index) {
                tracing::info!(meter, measurements = seen, "meters processed");
            }

            buffer.push(env);
            if buffer.len() >= self.batch_size {
                stats.inserted += insert_batch(&mut *tx, &buffer).await?;
                buffer.clear();
            }
        }

        if !buffer.is_empty() {
            stats.inserted += insert_batch(&mut *tx, &buffer).await?;
        }
        stats.meters = progress.meters();

        tx.commit().await?;

        tracing::info!(
            inserted_rows = stats.inserted,
            meters = stats.meters,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "measurement load committed"
        );
        Ok(stats)
    }
}

async fn insert_batch(
    conn: &mut SqliteConnection,
    batch: &[Envelope<Measurement>],
) -> Result<u64, sqlx::Error> {
    let started = Instant::now();

    let mut builder =
        QueryBuilder::<Sqlite>::new(r#"INSERT INTO data (meterID, date, value, unit, "type", spotID) "#);
    builder.push_values(batch, |mut b, env| {
        let m = &env.payload;
        b.push_bind(m.meter_id.as_str())
            .push_bind(m.date)
            .push_bind(f64::from(m.value))
            .push_bind(m.unit)
            .push_bind(m.kind)
            .push_bind(m.spot_id.as_str());
    });

    let inserted = builder.build().execute(conn).await?.rows_affected();

    metrics::counter!("datagen_measurements_inserted_total").increment(inserted);
    metrics::histogram!("datagen_batch_insert_seconds").record(started.elapsed().as_secs_f64());

    Ok(inserted)
}

#[async_trait::async_trait]
impl Sink<Measurement> for SqliteMeasurementSink {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<Measurement>, PipelineError>> + Send + Unpin + 'static,
    {
        match self.load(input).await {
            Ok(_) => Ok(()),
            Err(e) => {
                metrics::counter!("datagen_load_rollbacks_total").increment(1);
                Err(e)
            }
        }
    }
}

/// Tracks meter boundaries in the ordered input.
///
/// A meter is reported when its first record arrives and its index is a
/// multiple of `every`.
#[derive(Debug)]
struct Progress {
    every: usize,
    current: Option<usize>,
    meters: usize,
}

impl Progress {
    fn new(every: usize) -> Self {
        Self {
            every,
            current: None,
            meters: 0,
        }
    }

    /// Returns the index of a newly started meter that should be reported.
    fn observe(&mut self, meter_index: usize) -> Option<usize> {
        if self.current == Some(meter_index) {
            return None;
        }
        self.current = Some(meter_index);
        self.meters += 1;
        (meter_index % self.every == 0).then_some(meter_index)
    }

    fn meters(&self) -> usize {
        self.meters
    }
}
