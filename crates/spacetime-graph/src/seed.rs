//! Deterministic seed derivation.
//!
//! A run carries exactly one seed. Every stochastic decision draws from a
//! stream derived from `(run_seed, stream, index)`, so results never depend
//! on evaluation order or on how work is split across threads.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Stream used for ambient positions.
pub const POSITION_STREAM: u64 = 1;

/// Stream used for spontaneous energy sources.
pub const SOURCE_STREAM: u64 = 2;

/// Stream used for probabilistic edge admission (indexed by target event).
pub const ADMISSION_STREAM: u64 = 3;

/// Mix a run seed, a stream tag, and an index into a new 64-bit seed.
pub const fn derive_seed(run_seed: u64, stream: u64, index: u64) -> u64 {
    // 0x517cc1b727220a95 and 0x9e3779b97f4a7c15 are standard mixing constants.
    let mut state = run_seed
        .wrapping_add(stream.wrapping_mul(0x9e37_79b9_7f4a_7c15))
        .wrapping_add(index.wrapping_mul(0x517c_c1b7_2722_0a95));

    // xorshift requires non-zero input.
    if state == 0 {
        state = 0xdead_beef_cafe_babe;
    }

    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}

/// A reproducible RNG for one `(stream, index)` slot of a run.
pub fn stream_rng(run_seed: u64, stream: u64, index: u64) -> StdRng {
    StdRng::seed_from_u64(derive_seed(run_seed, stream, index))
}
