//! Benchmark workload - the fixed dataset every generation is measured on.

use serde::{Deserialize, Serialize};

const MULTIPLIER: u64 = 0x5_DEEC_E66D;
const ADDEND: u64 = 0xB;
const MASK: u64 = (1 << 48) - 1;

/// 48-bit linear congruential generator (multiplier `0x5DEECE66D`, addend
/// `0xB`) with a scrambled seed and a rejection-sampled bounded draw.
///
/// Using a fully specified generator keeps a workload reproducible across
/// runs, platforms and implementations of this harness.
#[derive(Debug, Clone)]
pub struct Lcg48 {
    state: u64,
}

impl Lcg48 {
    /// Seed a new generator.
    pub fn new(seed: u64) -> Self {
        Self {
            state: (seed ^ MULTIPLIER) & MASK,
        }
    }

    fn next(&mut self, bits: u32) -> i32 {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(ADDEND) & MASK;
        (self.state >> (48 - bits)) as u32 as i32
    }

    /// Uniform 32-bit value.
    pub fn next_i32(&mut self) -> i32 {
        self.next(32)
    }

    /// Uniform value in `[0, bound)`. `bound` must be positive.
    pub fn next_bounded(&mut self, bound: i32) -> i32 {
        debug_assert!(bound > 0);
        let m = bound - 1;
        let mut r = self.next(31);
        if bound & m == 0 {
            return ((bound as i64 * r as i64) >> 31) as i32;
        }
        let mut u = r;
        loop {
            r = u % bound;
            if u.wrapping_sub(r).wrapping_add(m) >= 0 {
                return r;
            }
            u = self.next(31);
        }
    }
}

/// Deterministic integer dataset, generated once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    seed: u64,
    values: Vec<i32>,
}

impl Workload {
    /// Generate `size` values in `[0, bound)` from `seed`.
    pub fn generate(seed: u64, size: usize, bound: i32) -> Self {
        let mut rng = Lcg48::new(seed);
        let values = (0..size).map(|_| rng.next_bounded(bound)).collect();
        Self { seed, values }
    }

    /// Seed the workload was generated from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Read-only view of the values.
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the workload is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fresh owned copy for one benchmark call.
    pub fn fresh_copy(&self) -> Vec<i32> {
        self.values.clone()
    }

    /// Canonical byte form (little-endian i32s).
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}
