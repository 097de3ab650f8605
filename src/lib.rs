//! Procedural landmass generation
//!
//! Fractal noise → elevation/moisture grids → land/sea classification, with an
//! optional accept/reject loop on the land fraction.

pub mod controller;
pub mod error;
pub mod fractal;
pub mod grid;
pub mod noise_source;
pub mod params;
pub mod seeds;
pub mod stats;
pub mod terrain;

pub use controller::{generate_map, GenerationController};
pub use error::{ConfigError, ConfigFileError, GenerationError};
pub use grid::Grid;
pub use params::{AcceptanceBand, NoiseConfig, NoiseKind, RetryPolicy, SquashPolicy, TerrainParams, TerrainPreset};
pub use seeds::{RandomSeeds, SeedSource, TerrainSeeds};
pub use terrain::{GenerationResult, TerrainGenerator};
