//! Deterministic random number generation for weather rolls.

use serde::{Deserialize, Serialize};

/// A simple random number generator for weather rolls.
/// Uses a linear congruential generator for deterministic results;
/// the state serializes with snapshots so a restored authority
/// continues the same roll sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimRng {
    state: u64,
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(12345)
    }
}

impl SimRng {
    /// Create a new RNG with a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate a random f32 in [0.0, 1.0).
    pub fn next_f32(&mut self) -> f32 {
        // LCG parameters (same as glibc)
        self.state = self.state.wrapping_mul(1_103_515_245).wrapping_add(12345);
        // Extract upper bits for better randomness
        let bits = (self.state >> 16) as u32 & 0x7FFF;
        bits as f32 / 32768.0
    }

    /// Generate a random f32 in [min, max).
    pub fn next_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Generate a random index in [0, len).
    ///
    /// Returns 0 when `len` is 0.
    pub fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f32() * len as f32) as usize).min(len - 1)
    }

    /// Set the seed.
    pub fn set_seed(&mut self, seed: u64) {
        self.state = seed;
    }
}
