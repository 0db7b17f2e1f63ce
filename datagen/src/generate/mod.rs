//! Synthetic dataset generation: identifiers, meter topology and the
//! measurement stream.

pub mod easing;
pub mod ids;
pub mod measurements;
pub mod topology;

pub use easing::CubicBezier;
pub use ids::{generate_ids, ID_LEN};
pub use measurements::MeasurementSource;
pub use topology::{build_topology, MeterAssignment, Topology};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("cannot assign {meters} meters without any spot")]
    NoSpots { meters: usize },
    #[error("invalid start year {0}")]
    InvalidStartYear(i32),
    #[error("a range of {days} days starting {start} is not representable")]
    DateOutOfRange { start: time::Date, days: usize },
}
