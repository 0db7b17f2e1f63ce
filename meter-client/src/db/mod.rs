pub mod measurement_queries;

use std::str::FromStr;

use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};

pub use measurement_queries::{
    count_measurements, daily_stats, load_profile, meter_samples, random_meters, top_spots,
};

/// Embedded schema migrations for the `data` table.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open a SQLite pool in WAL mode, creating the database file if needed.
///
/// Connections are never recycled, so `sqlite::memory:` databases survive
/// for the lifetime of the pool when `max_connections` is 1.
pub async fn connect(uri: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(uri)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Apply any pending migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
