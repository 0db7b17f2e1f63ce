pub mod sqlite;

pub use sqlite::{LoadStats, SqliteMeasurementSink};
