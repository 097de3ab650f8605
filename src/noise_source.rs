//! Seeded 2D coherent noise
//!
//! [`NoiseSource`] is the only seam between the terrain pipeline and the noise
//! primitive. The production implementation wraps the `noise` crate; tests
//! substitute counting or scripted sources through [`NoiseFactory`].

use noise::{NoiseFn, OpenSimplex, Perlin, Simplex};

use crate::params::NoiseKind;

/// A deterministic, continuous 2D noise function with output roughly in [-1, 1].
///
/// Rows are sampled in parallel, so a source may be called from any thread in
/// any order.
pub trait NoiseSource: Send + Sync {
    fn sample(&self, x: f64, y: f64) -> f64;
}

/// Builds a seeded [`NoiseSource`]. One source is built per field per attempt.
pub trait NoiseFactory: Send + Sync {
    type Source: NoiseSource;

    fn build(&self, kind: NoiseKind, seed: u32) -> Self::Source;
}

/// Noise backed by the `noise` crate's gradient generators.
#[derive(Clone, Debug)]
pub enum CoherentNoise {
    Simplex(Simplex),
    Perlin(Perlin),
    OpenSimplex(OpenSimplex),
}

impl CoherentNoise {
    pub fn new(kind: NoiseKind, seed: u32) -> Self {
        match kind {
            NoiseKind::Simplex => Self::Simplex(Simplex::new(seed)),
            NoiseKind::Perlin => Self::Perlin(Perlin::new(seed)),
            NoiseKind::OpenSimplex => Self::OpenSimplex(OpenSimplex::new(seed)),
        }
    }
}

impl NoiseSource for CoherentNoise {
    fn sample(&self, x: f64, y: f64) -> f64 {
        match self {
            Self::Simplex(n) => n.get([x, y]),
            Self::Perlin(n) => n.get([x, y]),
            Self::OpenSimplex(n) => n.get([x, y]),
        }
    }
}

/// Factory for [`CoherentNoise`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CoherentNoiseFactory;

impl NoiseFactory for CoherentNoiseFactory {
    type Source = CoherentNoise;

    fn build(&self, kind: NoiseKind, seed: u32) -> CoherentNoise {
        CoherentNoise::new(kind, seed)
    }
}
