//! Seeded generator streams for parallel resampling.

use rand_pcg::Pcg64;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Generator for draw `stream` of a run seeded with `seed`.
///
/// The seed is hashed into the generator state and the index selects the
/// PCG stream, so neighbouring seeds never replay each other's draws.
pub(crate) fn stream_rng(seed: u64, stream: u64) -> Pcg64 {
    let high = splitmix64(seed);
    let low = splitmix64(high ^ seed.rotate_left(32));
    let state = (u128::from(high) << 64) | u128::from(low);
    Pcg64::new(state, u128::from(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn draws(seed: u64, stream: u64) -> Vec<u32> {
        let mut rng = stream_rng(seed, stream);
        (0..16).map(|_| rng.random_range(0..1_000_000)).collect()
    }

    #[test]
    fn same_seed_and_stream_repeat() {
        assert_eq!(draws(42, 3), draws(42, 3));
    }

    #[test]
    fn adjacent_seeds_do_not_share_streams() {
        for i in 0..32 {
            assert_ne!(draws(42, i), draws(43, i));
            assert_ne!(draws(42, i + 1), draws(43, i));
            assert_ne!(draws(43, i + 1), draws(42, i));
        }
    }

    #[test]
    fn streams_of_one_seed_differ() {
        assert_ne!(draws(42, 0), draws(42, 1));
    }
}
