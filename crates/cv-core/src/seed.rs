//! Deterministic random streams derived from the single configured seed.
//!
//! Every consumer of randomness (split, resampling, tree bagging) asks for a
//! named stream. A stream depends only on the base seed and its name, so the
//! order in which strategies or candidates run never changes their output.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// FNV-1a over the stream name; stable across platforms and releases.
fn fnv1a(label: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in label.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// SplitMix64 finaliser.
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Derive a sub-seed for a named stream.
pub fn derive_seed(seed: u64, stream: &str) -> u64 {
    mix(seed ^ fnv1a(stream))
}

/// Seeded generator for a named stream.
pub fn stream_rng(seed: u64, stream: &str) -> StdRng {
    StdRng::seed_from_u64(derive_seed(seed, stream))
}
