//! Fractal Brownian motion over a single noise source.

use crate::noise_source::NoiseSource;

/// Sums octaves of one [`NoiseSource`]: octave `i` samples at
/// `base_frequency * 2^i` with amplitude `falloff^i`.
///
/// The sum is returned raw. Its range grows with the octave count and falloff,
/// so the caller picks the normalization.
pub struct FractalField<N> {
    source: N,
    base_frequency: f64,
}

impl<N: NoiseSource> FractalField<N> {
    pub fn new(source: N, base_frequency: f64) -> Self {
        Self {
            source,
            base_frequency,
        }
    }

    pub fn sample(&self, nx: f64, ny: f64, octaves: u32, amplitude_falloff: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.base_frequency;

        for _ in 0..octaves {
            total += amplitude * self.source.sample(nx * frequency, ny * frequency);
            amplitude *= amplitude_falloff;
            frequency *= 2.0;
        }

        total
    }

    pub fn source(&self) -> &N {
        &self.source
    }
}

/// Upper bound of `|FractalField::sample|` when the source stays within [-1, 1].
pub fn amplitude_sum(octaves: u32, amplitude_falloff: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    for _ in 0..octaves {
        total += amplitude;
        amplitude *= amplitude_falloff;
    }
    total
}
