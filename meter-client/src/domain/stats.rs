use time::Date;

use super::MeterKind;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpotUsage {
    pub spot_id: String,
    pub meter_count: i64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeterSample {
    pub meter_id: String,
    pub measurement_count: i64,
}

/// Aggregate of one (date, spot, type) group.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DailyStats {
    pub date: Date,
    pub spot_id: String,
    pub kind: MeterKind,
    pub unit: String,
    pub meter_count: i64,
    pub day_total: f64,
    pub day_avg: f64,
}
