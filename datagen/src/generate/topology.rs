use meter_client::domain::MeterKind;
use rand::Rng;

use super::{easing::SPOT_EASING, GenerationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterAssignment {
    pub meter_id: String,
    pub spot_id: String,
    pub kind: MeterKind,
}

/// Meter to spot assignments, in meter generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub meters: Vec<MeterAssignment>,
}

impl Topology {
    pub fn len(&self) -> usize {
        self.meters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MeterAssignment> {
        self.meters.iter()
    }
}

/// Assign every meter to one spot and a utility type.
///
/// Spots are picked through [`SPOT_EASING`], so the lower half of `spots`
/// collects most meters and the last indices very few. Types are a fair
/// coin flip.
pub fn build_topology<R: Rng + ?Sized>(
    rng: &mut R,
    spots: &[String],
    meter_ids: Vec<String>,
) -> Result<Topology, GenerationError> {
    if spots.is_empty() && !meter_ids.is_empty() {
        return Err(GenerationError::NoSpots {
            meters: meter_ids.len(),
        });
    }

    let meters = meter_ids
        .into_iter()
        .map(|meter_id| {
            let spot_id = spots[pick_spot(rng.random::<f64>(), spots.len())].clone();
            let kind = if rng.random_bool(0.5) {
                MeterKind::Gas
            } else {
                MeterKind::Elec
            };
            MeterAssignment {
                meter_id,
                spot_id,
                kind,
            }
        })
        .collect();

    Ok(Topology { meters })
}

/// Index of the spot selected by the uniform draw `u`; `spot_count` must be non-zero.
fn pick_spot(u: f64, spot_count: usize) -> usize {
    let scaled = (SPOT_EASING.ease(u) * spot_count as f64).floor();
    // The curve may overshoot [0, 1); clamp into the list.
    scaled.clamp(0.0, (spot_count - 1) as f64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::generate_ids;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn every_meter_gets_a_known_spot() {
        let mut rng = StdRng::seed_from_u64(11);
        let spots = generate_ids(&mut rng, 7);
        let meters = generate_ids(&mut rng, 300);

        let topology = build_topology(&mut rng, &spots, meters.clone()).unwrap();
        assert_eq!(topology.len(), 300);

        let known: HashSet<&String> = spots.iter().collect();
        for (assignment, meter_id) in topology.iter().zip(&meters) {
            assert_eq!(&assignment.meter_id, meter_id);
            assert!(known.contains(&assignment.spot_id));
        }
    }

    #[test]
    fn assignment_is_skewed_toward_lower_half() {
        let mut rng = StdRng::seed_from_u64(3);
        let spots: Vec<String> = (0..4).map(|i| format!("spot-{i}")).collect();
        let meters = generate_ids(&mut rng, 2_000);

        let topology = build_topology(&mut rng, &spots, meters).unwrap();
        let count = |spot: &str| topology.iter().filter(|m| m.spot_id == spot).count();

        // Quarter shares are roughly 36%, 54%, 8% and 2%.
        let lower = count("spot-0") + count("spot-1");
        let upper = count("spot-2") + count("spot-3");
        assert!(lower > 4 * upper, "lower = {lower}, upper = {upper}");
        assert!(count("spot-1") > count("spot-3"));
        assert!(count("spot-0") > 3 * count("spot-3"));
    }

    #[test]
    fn types_are_roughly_balanced() {
        let mut rng = StdRng::seed_from_u64(8);
        let spots = vec!["s".to_string()];
        let meters = generate_ids(&mut rng, 2_000);

        let topology = build_topology(&mut rng, &spots, meters).unwrap();
        let gas = topology.iter().filter(|m| m.kind == MeterKind::Gas).count();
        assert!((800..1_200).contains(&gas), "gas = {gas}");
    }

    #[test]
    fn meters_without_spots_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = build_topology(&mut rng, &[], vec!["m".to_string()]).unwrap_err();
        assert_eq!(err, GenerationError::NoSpots { meters: 1 });

        let empty = build_topology(&mut rng, &[], Vec::new()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn pick_spot_stays_in_bounds() {
        assert_eq!(pick_spot(0.0, 5), 0);
        assert_eq!(pick_spot(0.999_999, 5), 4);
        assert_eq!(pick_spot(1.0, 5), 4);
        assert_eq!(pick_spot(0.5, 1), 0);
    }
}
