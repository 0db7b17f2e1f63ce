use rand::Rng;

/// Length of every generated identifier.
pub const ID_LEN: usize = 20;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Produce `count` random lowercase hex identifiers of [`ID_LEN`] characters.
///
/// Collisions are not checked; at 80 bits of randomness they are negligible
/// for the few thousand ids a run needs.
pub fn generate_ids<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    (0..count).map(|_| random_id(rng)).collect()
}

fn random_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_LEN)
        .map(|_| char::from(HEX[rng.random_range(0..HEX.len())]))
        .collect()
}
