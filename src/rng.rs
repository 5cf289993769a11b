//! Deterministic, seedable RNG streams and seed/salt hashing
//!
//! Every source of randomness in a race is an explicit `RaceRng` value derived
//! from (seed, salt) through FNV-1a. Identical (seed, salt) yields an
//! identical stream on any machine; distinct salts yield independent streams,
//! so no runner's randomness leaks into another's. There is no global RNG.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

/// A committed race seed: an integer or an arbitrary string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Seed {
    Int(u64),
    Text(String),
}

impl std::fmt::Display for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Seed::Int(n) => write!(f, "{n}"),
            Seed::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for Seed {
    fn from(n: u64) -> Self {
        Seed::Int(n)
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Seed::Text(s.to_string())
    }
}

impl From<String> for Seed {
    fn from(s: String) -> Self {
        Seed::Text(s)
    }
}

/// Hash a (seed, salt) pair to a 64-bit sub-seed (FNV-1a over `"{seed}:{salt}"`)
pub fn hash_seed(seed: &Seed, salt: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let key = format!("{seed}:{salt}");
    let mut h = FNV_OFFSET;
    for &b in key.as_bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// A deterministic uniform/normal sample stream over Pcg32
#[derive(Debug, Clone)]
pub struct RaceRng {
    rng: Pcg32,
}

impl RaceRng {
    /// Create a stream from a concrete sub-seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Create a stream from a (seed, salt) pair
    pub fn from_salted(seed: &Seed, salt: &str) -> Self {
        Self::new(hash_seed(seed, salt))
    }

    /// Next raw u32
    pub fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    /// Uniform float in [0, 1)
    pub fn next_float(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Uniform float in [min, max)
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_float()
    }

    /// Uniform integer in [min, max] inclusive
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        self.next_range(min as f64, (max + 1) as f64).floor() as i64
    }

    /// Normal sample via single-pass Box-Muller
    pub fn normal(&mut self, mean: f64, std: f64) -> f64 {
        let mut u = 0.0;
        let mut v = 0.0;
        while u == 0.0 {
            u = self.next_float();
        }
        while v == 0.0 {
            v = self.next_float();
        }
        let mag = (-2.0 * u.ln()).sqrt();
        mean + std * mag * (std::f64::consts::TAU * v).cos()
    }
}
