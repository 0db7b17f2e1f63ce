use crate::pipeline::{Envelope, PipelineError, Transform};
use meter_client::domain::{Measurement, MAX_VALUE};
use time::Date;

/// Pure validation of a generated `Measurement`.
///
/// Rules:
/// - value must be within [0, 9999].
/// - date must fall in the generated window `[start, end)`.
pub fn validate_measurement(
    env: Envelope<Measurement>,
    start: Date,
    end: Date,
) -> Result<Envelope<Measurement>, PipelineError> {
    let m = &env.payload;

    if m.value > MAX_VALUE {
        return Err(PipelineError::Transform(format!(
            "value {} of meter {} exceeds {MAX_VALUE}",
            m.value, m.meter_id
        )));
    }

    if m.date < start || m.date >= end {
        return Err(PipelineError::Transform(format!(
            "date {} of meter {} outside [{start}, {end})",
            m.date, m.meter_id
        )));
    }

    Ok(env)
}

#[derive(Clone, Debug)]
pub struct MeasurementValidation {
    start: Date,
    end: Date,
}

impl MeasurementValidation {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }
}

#[async_trait::async_trait]
impl Transform<Measurement, Measurement> for MeasurementValidation {
    async fn apply(
        &self,
        input: Envelope<Measurement>,
    ) -> Result<Envelope<Measurement>, PipelineError> {
        match validate_measurement(input, self.start, self.end) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("datagen_validation_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}
