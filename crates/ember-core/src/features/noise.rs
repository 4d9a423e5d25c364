//! Injectable randomness for feature synthesis.
//!
//! Production uses `RandomNoise` over a `StdRng`; tests substitute a seeded
//! generator or `ZeroNoise` to make the synthetic features reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Source of the noise terms added to synthetic features.
pub trait NoiseSource {
    /// Sample from N(mean, sd²).
    fn gaussian(&mut self, mean: f64, sd: f64) -> f64;
    /// Sample uniformly from [lo, hi).
    fn uniform(&mut self, lo: f64, hi: f64) -> f64;
}

/// Noise drawn from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomNoise<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomNoise<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> NoiseSource for RandomNoise<R> {
    fn gaussian(&mut self, mean: f64, sd: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + sd * z
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }
}

/// Deterministic source: every Gaussian returns its mean, every uniform the
/// midpoint of its interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    fn gaussian(&mut self, mean: f64, _sd: f64) -> f64 {
        mean
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        (lo + hi) / 2.0
    }
}

/// How a service obtains a fresh noise source per prediction or grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoisePolicy {
    /// OS entropy, different on every call.
    #[default]
    Entropy,
    /// Reproducible: each stream index gets its own derived seed.
    Seeded(u64),
    /// No noise at all.
    Zero,
}

impl NoisePolicy {
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or(NoisePolicy::Entropy, NoisePolicy::Seeded)
    }

    /// Independent source for `stream` (0 for point queries, cell index for
    /// grid cells).
    pub fn source(&self, stream: u64) -> Box<dyn NoiseSource + Send> {
        match *self {
            NoisePolicy::Entropy => Box::new(RandomNoise::from_entropy()),
            NoisePolicy::Seeded(seed) => Box::new(RandomNoise::seeded(mix_seed(seed, stream))),
            NoisePolicy::Zero => Box::new(ZeroNoise),
        }
    }
}

/// SplitMix64 finaliser over seed and stream, so neighbouring cells do not get
/// correlated generators.
fn mix_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
