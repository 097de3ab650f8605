//! Elevation and moisture grid generation
//!
//! Every cell is sampled from a fractal noise field at its normalized
//! coordinate, squashed into [0, 1] and classified against sea level.
//!
//! Parallelization: rows are filled with rayon. Each row returns its own sea
//! count and the counts are summed, so the output does not depend on
//! scheduling.

use rayon::prelude::*;
use serde::Serialize;

use crate::error::ConfigError;
use crate::fractal::{amplitude_sum, FractalField};
use crate::grid::Grid;
use crate::noise_source::{CoherentNoiseFactory, NoiseFactory};
use crate::params::{validate_generation, NoiseConfig, SquashPolicy};
use crate::seeds::TerrainSeeds;

/// A generated map and its land/sea statistics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerationResult {
    /// Squashed elevation, clamped to `sea_level` on sea cells if requested
    pub elevation: Grid<f64>,
    /// Squashed moisture, if a moisture field was configured
    pub moisture: Option<Grid<f64>>,
    /// `true` where the pre-clamp elevation is at or above sea level
    pub land_mask: Grid<bool>,
    /// Cells whose pre-clamp elevation fell below sea level
    pub sea_cell_count: usize,
    /// `1 - sea_cell_count / (width * height)`
    pub land_fraction: f64,
    /// Sea level the map was classified against
    pub sea_level: f64,
    /// Seeds the fields were built from
    pub seed_used: TerrainSeeds,
    /// Attempt that produced this map (1 for a direct generator call)
    pub attempts: u32,
}

impl GenerationResult {
    pub fn width(&self) -> usize {
        self.elevation.width()
    }

    pub fn height(&self) -> usize {
        self.elevation.height()
    }

    pub fn cell_count(&self) -> usize {
        self.elevation.len()
    }

    pub fn land_cell_count(&self) -> usize {
        self.cell_count() - self.sea_cell_count
    }

    pub fn is_land(&self, x: usize, y: usize) -> bool {
        *self.land_mask.get(x, y)
    }
}

/// Fills elevation (and optionally moisture) grids from seeded fractal noise.
pub struct TerrainGenerator<F = CoherentNoiseFactory> {
    factory: F,
    squash: SquashPolicy,
}

impl TerrainGenerator<CoherentNoiseFactory> {
    pub fn new(squash: SquashPolicy) -> Self {
        Self::with_factory(CoherentNoiseFactory, squash)
    }
}

impl Default for TerrainGenerator<CoherentNoiseFactory> {
    fn default() -> Self {
        Self::new(SquashPolicy::default())
    }
}

impl<F: NoiseFactory> TerrainGenerator<F> {
    /// Generator that builds its noise sources from `factory`.
    pub fn with_factory(factory: F, squash: SquashPolicy) -> Self {
        Self { factory, squash }
    }

    pub fn squash(&self) -> SquashPolicy {
        self.squash
    }

    /// Generate one map.
    ///
    /// The configuration is validated before anything is allocated. The same
    /// arguments always produce a bit-identical result.
    #[allow(clippy::too_many_arguments)]
    pub fn generate(
        &self,
        width: usize,
        height: usize,
        elevation_cfg: &NoiseConfig,
        moisture_cfg: Option<&NoiseConfig>,
        sea_level: f64,
        clamp_below_sea_level: bool,
    ) -> Result<GenerationResult, ConfigError> {
        validate_generation(width, height, elevation_cfg, moisture_cfg, sea_level)?;

        let mut elevation = Grid::new_with(width, height, 0.0f64);
        let mut land_mask = Grid::new_with(width, height, false);

        let field = self.field(elevation_cfg);
        let amplitude = amplitude_sum(elevation_cfg.octaves, elevation_cfg.amplitude_falloff);
        let squash = self.squash;

        let sea_cell_count: usize = elevation
            .as_mut_slice()
            .par_chunks_mut(width)
            .zip(land_mask.as_mut_slice().par_chunks_mut(width))
            .enumerate()
            .map(|(y, (elevation_row, land_row))| {
                let ny = y as f64 / height as f64;
                let mut sea = 0;
                for (x, (cell, land)) in elevation_row.iter_mut().zip(land_row.iter_mut()).enumerate() {
                    let nx = x as f64 / width as f64;
                    let raw = field.sample(nx, ny, elevation_cfg.octaves, elevation_cfg.amplitude_falloff);
                    let value = squash.apply(raw, amplitude);

                    if value < sea_level {
                        sea += 1;
                        *cell = if clamp_below_sea_level { sea_level } else { value };
                    } else {
                        *cell = value;
                        *land = true;
                    }
                }
                sea
            })
            .sum();

        let moisture = moisture_cfg.map(|cfg| self.moisture_grid(width, height, cfg));

        let total = width * height;
        let land_fraction = (total - sea_cell_count) as f64 / total as f64;
        let seed_used = TerrainSeeds {
            elevation: elevation_cfg.seed,
            moisture: moisture_cfg.map(|cfg| cfg.seed),
        };

        log::debug!(
            "Generated {}x{} map ({}): {:.1}% land, {} sea cells",
            width,
            height,
            seed_used,
            land_fraction * 100.0,
            sea_cell_count
        );

        Ok(GenerationResult {
            elevation,
            moisture,
            land_mask,
            sea_cell_count,
            land_fraction,
            sea_level,
            seed_used,
            attempts: 1,
        })
    }

    fn field(&self, cfg: &NoiseConfig) -> FractalField<F::Source> {
        FractalField::new(self.factory.build(cfg.kind, cfg.seed), cfg.base_frequency)
    }

    /// Moisture uses the same squash but is never thresholded or clamped.
    fn moisture_grid(&self, width: usize, height: usize, cfg: &NoiseConfig) -> Grid<f64> {
        let field = self.field(cfg);
        let amplitude = amplitude_sum(cfg.octaves, cfg.amplitude_falloff);
        let squash = self.squash;

        let mut moisture = Grid::new_with(width, height, 0.0f64);
        moisture
            .as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let ny = y as f64 / height as f64;
                for (x, cell) in row.iter_mut().enumerate() {
                    let nx = x as f64 / width as f64;
                    let raw = field.sample(nx, ny, cfg.octaves, cfg.amplitude_falloff);
                    *cell = squash.apply(raw, amplitude);
                }
            });
        moisture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise_source::{CoherentNoise, NoiseSource};
    use crate::params::NoiseKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts noise evaluations across every source it builds.
    #[derive(Clone, Default)]
    struct CountingFactory {
        calls: Arc<AtomicUsize>,
    }

    struct CountingSource {
        inner: CoherentNoise,
        calls: Arc<AtomicUsize>,
    }

    impl NoiseSource for CountingSource {
        fn sample(&self, x: f64, y: f64) -> f64 {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.inner.sample(x, y)
        }
    }

    impl NoiseFactory for CountingFactory {
        type Source = CountingSource;

        fn build(&self, kind: NoiseKind, seed: u32) -> CountingSource {
            CountingSource {
                inner: CoherentNoise::new(kind, seed),
                calls: Arc::clone(&self.calls),
            }
        }
    }

    fn elevation_cfg(seed: u32) -> NoiseConfig {
        NoiseConfig {
            base_frequency: 4.0,
            ..NoiseConfig::new(seed, 6)
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = TerrainGenerator::new(SquashPolicy::LinearRescale);
        let moisture = NoiseConfig::new(99, 12);

        let a = generator.generate(64, 48, &elevation_cfg(7), Some(&moisture), 0.4, false).unwrap();
        let b = generator.generate(64, 48, &elevation_cfg(7), Some(&moisture), 0.4, false).unwrap();

        assert_eq!(a, b);
        let bits = |g: &Grid<f64>| g.as_slice().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.elevation), bits(&b.elevation));
    }

    #[test]
    fn test_matches_sequential_evaluation() {
        let cfg = elevation_cfg(3);
        let generator = TerrainGenerator::new(SquashPolicy::Logistic);
        let result = generator.generate(40, 30, &cfg, None, 0.5, false).unwrap();

        let field = FractalField::new(CoherentNoise::new(cfg.kind, cfg.seed), cfg.base_frequency);
        let amplitude = amplitude_sum(cfg.octaves, cfg.amplitude_falloff);
        for y in 0..30 {
            for x in 0..40 {
                let raw = field.sample(x as f64 / 40.0, y as f64 / 30.0, cfg.octaves, cfg.amplitude_falloff);
                let expected = SquashPolicy::Logistic.apply(raw, amplitude);
                assert_eq!(result.elevation.get(x, y).to_bits(), expected.to_bits(), "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_sea_count_matches_unclamped_cells() {
        let generator = TerrainGenerator::new(SquashPolicy::LinearRescale);
        let result = generator.generate(80, 80, &elevation_cfg(11), None, 0.5, false).unwrap();

        assert_eq!(result.sea_cell_count, result.elevation.count_below(0.5));
        assert!((0.0..=1.0).contains(&result.land_fraction));
        let expected = 1.0 - result.sea_cell_count as f64 / 6400.0;
        assert!((result.land_fraction - expected).abs() < 1e-12);
        assert_eq!(result.land_mask.as_slice().iter().filter(|&&l| !l).count(), result.sea_cell_count);
    }

    #[test]
    fn test_clamp_flattens_sea_to_sea_level() {
        let generator = TerrainGenerator::new(SquashPolicy::LinearRescale);
        let cfg = elevation_cfg(21);
        let relief = generator.generate(64, 64, &cfg, None, 0.5, false).unwrap();
        let flat = generator.generate(64, 64, &cfg, None, 0.5, true).unwrap();

        assert!(relief.sea_cell_count > 0, "test needs some sea");
        assert_eq!(relief.sea_cell_count, flat.sea_cell_count);
        assert_eq!(relief.land_mask, flat.land_mask);

        for ((&before, &after), &land) in relief
            .elevation
            .as_slice()
            .iter()
            .zip(flat.elevation.as_slice())
            .zip(flat.land_mask.as_slice())
        {
            assert!(after >= 0.5);
            if land {
                assert_eq!(before, after);
            } else {
                assert!(before < 0.5);
                assert_eq!(after, 0.5);
            }
        }
    }

    #[test]
    fn test_calls_per_cell_equal_octaves() {
        for octaves in [1, 2, 5] {
            let factory = CountingFactory::default();
            let generator = TerrainGenerator::with_factory(factory.clone(), SquashPolicy::LinearRescale);
            let cfg = NoiseConfig::new(1, octaves);
            generator.generate(10, 7, &cfg, None, 0.4, false).unwrap();
            assert_eq!(factory.calls.load(Ordering::Relaxed), 70 * octaves as usize);
        }
    }

    #[test]
    fn test_moisture_adds_its_own_octaves() {
        let factory = CountingFactory::default();
        let generator = TerrainGenerator::with_factory(factory.clone(), SquashPolicy::LinearRescale);
        generator
            .generate(10, 10, &NoiseConfig::new(1, 3), Some(&NoiseConfig::new(2, 5)), 0.4, false)
            .unwrap();
        assert_eq!(factory.calls.load(Ordering::Relaxed), 100 * (3 + 5));
    }

    #[test]
    fn test_moisture_is_not_clamped() {
        let generator = TerrainGenerator::new(SquashPolicy::LinearRescale);
        let moisture_cfg = elevation_cfg(5);
        let result = generator
            .generate(32, 32, &elevation_cfg(4), Some(&moisture_cfg), 0.5, true)
            .unwrap();
        let moisture = result.moisture.expect("moisture requested");
        assert!(moisture.as_slice().iter().any(|&m| m < 0.5));
        assert_eq!(result.seed_used.moisture, Some(5));
    }

    #[test]
    fn test_invalid_config_does_no_work() {
        let factory = CountingFactory::default();
        let generator = TerrainGenerator::with_factory(factory.clone(), SquashPolicy::LinearRescale);

        let err = generator.generate(0, 10, &NoiseConfig::new(1, 4), None, 0.4, false);
        assert!(matches!(err, Err(ConfigError::InvalidDimensions { .. })));

        let err = generator.generate(10, 10, &NoiseConfig::new(1, 4), Some(&NoiseConfig::new(2, 0)), 0.4, false);
        assert!(matches!(err, Err(ConfigError::InvalidOctaves { field: "moisture", .. })));

        let err = generator.generate(10, 10, &NoiseConfig::new(1, 4), None, f64::NAN, false);
        assert!(matches!(err, Err(ConfigError::InvalidSeaLevel(_))));

        assert_eq!(factory.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_overflowing_cell_count_is_rejected() {
        let factory = CountingFactory::default();
        let generator = TerrainGenerator::with_factory(factory.clone(), SquashPolicy::LinearRescale);
        let width = usize::MAX / 2 + 1;

        let err = generator.generate(width, 2, &NoiseConfig::new(1, 4), None, 0.4, false);
        assert_eq!(err, Err(ConfigError::InvalidDimensions { width, height: 2 }));
        assert_eq!(factory.calls.load(Ordering::Relaxed), 0);
    }
}
