mod measurement;
mod meter;
mod stats;

pub use measurement::{Measurement, MeasurementRow, MAX_VALUE, UNIT_WH};
pub use meter::MeterKind;
pub use stats::{DailyStats, MeterSample, SpotUsage};
