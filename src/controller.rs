//! Accept/reject loop over generated maps
//!
//! Single-shot generation and "retry until the land fraction looks right" are
//! the same loop: without an acceptance band the first attempt is accepted.

use std::time::Instant;

use crate::error::GenerationError;
use crate::noise_source::{CoherentNoiseFactory, NoiseFactory};
use crate::params::{validate_generation, NoiseConfig, RetryPolicy, TerrainParams};
use crate::seeds::{RandomSeeds, SeedSource};
use crate::terrain::{GenerationResult, TerrainGenerator};

/// Drives a [`TerrainGenerator`] with fresh seeds until a map is accepted.
pub struct GenerationController<F = CoherentNoiseFactory, S = RandomSeeds> {
    generator: TerrainGenerator<F>,
    seeds: S,
}

impl<S: SeedSource> GenerationController<CoherentNoiseFactory, S> {
    /// Controller using the squash policy from `params`.
    pub fn from_params(params: &TerrainParams, seeds: S) -> Self {
        Self::new(TerrainGenerator::new(params.squash), seeds)
    }
}

impl<F: NoiseFactory, S: SeedSource> GenerationController<F, S> {
    pub fn new(generator: TerrainGenerator<F>, seeds: S) -> Self {
        Self { generator, seeds }
    }

    pub fn generator(&self) -> &TerrainGenerator<F> {
        &self.generator
    }

    /// Generate maps until one satisfies `policy`.
    ///
    /// The seeds in the templates are ignored: every attempt draws a new
    /// elevation seed, and a moisture seed if a moisture template is given.
    /// The accepted result records which attempt produced it.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_accepted(
        &mut self,
        width: usize,
        height: usize,
        elevation_template: &NoiseConfig,
        moisture_template: Option<&NoiseConfig>,
        sea_level: f64,
        clamp_below_sea_level: bool,
        policy: &RetryPolicy,
    ) -> Result<GenerationResult, GenerationError> {
        validate_generation(width, height, elevation_template, moisture_template, sea_level)?;
        policy.validate()?;

        let started = Instant::now();
        let deadline = policy.deadline();
        let mut attempt: u32 = 1;

        loop {
            let seeds = self.seeds.next_seeds(moisture_template.is_some());
            log::trace!("Attempt {}: {}", attempt, seeds);

            let elevation_cfg = elevation_template.with_seed(seeds.elevation);
            let moisture_cfg = moisture_template
                .zip(seeds.moisture)
                .map(|(template, seed)| template.with_seed(seed));

            let mut result = self.generator.generate(
                width,
                height,
                &elevation_cfg,
                moisture_cfg.as_ref(),
                sea_level,
                clamp_below_sea_level,
            )?;
            result.attempts = attempt;

            let Some(band) = policy.band else {
                return Ok(result);
            };

            if band.contains(result.land_fraction) {
                log::info!(
                    "Accepted map on attempt {} ({:.1}% land, {})",
                    attempt,
                    result.land_fraction * 100.0,
                    result.seed_used
                );
                return Ok(result);
            }

            log::debug!(
                "Rejected attempt {}: {:.1}% land outside ({:.1}%, {:.1}%)",
                attempt,
                result.land_fraction * 100.0,
                band.min_fraction * 100.0,
                band.max_fraction * 100.0
            );

            if policy.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(GenerationError::RetryExhausted {
                    attempts: attempt,
                    last: Box::new(result),
                });
            }
            if let Some(deadline) = deadline {
                if started.elapsed() >= deadline {
                    return Err(GenerationError::DeadlineExceeded {
                        attempts: attempt,
                        deadline,
                        last: Box::new(result),
                    });
                }
            }

            attempt = attempt.saturating_add(1);
        }
    }

    /// Run the full pipeline described by `params`.
    pub fn run(&mut self, params: &TerrainParams) -> Result<GenerationResult, GenerationError> {
        self.generate_accepted(
            params.width,
            params.height,
            &params.elevation,
            params.moisture.as_ref(),
            params.sea_level,
            params.clamp_below_sea_level,
            &params.retry,
        )
    }
}

/// Generate a map for `params`, drawing seeds from `seeds`.
pub fn generate_map<S: SeedSource>(params: &TerrainParams, seeds: S) -> Result<GenerationResult, GenerationError> {
    params.validate()?;
    GenerationController::from_params(params, seeds).run(params)
}
