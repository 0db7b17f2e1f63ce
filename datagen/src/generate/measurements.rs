use std::sync::Arc;

use async_stream::stream;
use meter_client::domain::{Measurement, MAX_VALUE, UNIT_WH};
use rand::Rng;
use time::{Date, Duration, Month};

use super::{GenerationError, Topology};
use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// Lazy source of one measurement per meter and day.
///
/// Records come meter by meter, then day by day. Every call to
/// [`Source::stream`] starts over from the same random state, so the
/// sequence cannot be resumed halfway, only replayed.
pub struct MeasurementSource<R> {
    topology: Arc<Topology>,
    start: Date,
    days: usize,
    rng: R,
}

impl<R> MeasurementSource<R> {
    pub fn new(topology: Topology, start: Date, days: usize, rng: R) -> Result<Self, GenerationError> {
        let out_of_range = GenerationError::DateOutOfRange { start, days };
        let span = i64::try_from(days).map_err(|_| out_of_range.clone())?;
        start
            .checked_add(Duration::days(span))
            .ok_or(out_of_range)?;

        Ok(Self {
            topology: Arc::new(topology),
            start,
            days,
            rng,
        })
    }

    /// Start at January 1 of `year`.
    pub fn starting_in_year(topology: Topology, year: i32, days: usize, rng: R) -> Result<Self, GenerationError> {
        let start = Date::from_calendar_date(year, Month::January, 1)
            .map_err(|_| GenerationError::InvalidStartYear(year))?;
        Self::new(topology, start, days, rng)
    }

    pub fn start(&self) -> Date {
        self.start
    }

    /// First day after the generated range.
    pub fn end(&self) -> Date {
        self.start + Duration::days(self.days as i64)
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn meter_count(&self) -> usize {
        self.topology.len()
    }

    pub fn expected_rows(&self) -> usize {
        self.topology.len() * self.days
    }
}

#[async_trait::async_trait]
impl<R> Source<Measurement> for MeasurementSource<R>
where
    R: Rng + Clone + Send + Sync + 'static,
{
    async fn stream(&self) -> EnvelopeStream<Measurement> {
        let topology = Arc::clone(&self.topology);
        let start = self.start;
        let days = self.days;
        let mut rng = self.rng.clone();

        let s = stream! {
            for (meter_index, meter) in topology.iter().enumerate() {
                for day in 0..days {
                    // The whole range was checked in `new`.
                    let date = start + Duration::days(day as i64);
                    yield Ok::<_, PipelineError>(Envelope {
                        payload: Measurement {
                            meter_id: meter.meter_id.clone(),
                            date,
                            value: rng.random_range(0..=MAX_VALUE),
                            unit: UNIT_WH,
                            kind: meter.kind,
                            spot_id: meter.spot_id.clone(),
                        },
                        meter_index,
                    });
                }
            }
        };

        Box::pin(s)
    }
}
