use time::Date;

use super::MeterKind;

/// Unit written on every generated measurement.
pub const UNIT_WH: &str = "Wh";

/// Largest consumption value a generated measurement may carry.
pub const MAX_VALUE: u16 = 9_999;

/// One meter-day consumption record, as produced by the generator.
///
/// `kind` and `spot_id` are copies of the owning meter's assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub meter_id: String,
    pub date: Date,
    pub value: u16,
    pub unit: &'static str,
    pub kind: MeterKind,
    pub spot_id: String,
}

/// A persisted row of the `data` table.
#[derive(Debug, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeasurementRow {
    pub id: i64,
    pub meter_id: String,
    pub date: Date,
    pub value: f64,
    pub unit: String,
    pub kind: MeterKind,
    pub spot_id: String,
}
