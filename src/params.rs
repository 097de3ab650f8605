//! Terrain generation parameters and configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigFileError};

/// Upper bound on fractal octaves. Each octave costs one noise evaluation per cell.
pub const MAX_OCTAVES: u32 = 32;

/// Default retry cap when an acceptance band is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Coherent-noise primitive backing a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    #[default]
    Simplex,
    Perlin,
    OpenSimplex,
}

impl NoiseKind {
    /// Parse from string (for CLI)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "simplex" => Some(Self::Simplex),
            "perlin" => Some(Self::Perlin),
            "open-simplex" | "open_simplex" | "opensimplex" => Some(Self::OpenSimplex),
            _ => None,
        }
    }
}

impl std::fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simplex => write!(f, "simplex"),
            Self::Perlin => write!(f, "perlin"),
            Self::OpenSimplex => write!(f, "open-simplex"),
        }
    }
}

/// Parameters of one fractal noise field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Noise seed. Overwritten per attempt when seeds are drawn by the controller.
    pub seed: u32,
    /// Number of octaves (1..=MAX_OCTAVES)
    pub octaves: u32,
    /// Frequency of the first octave over the unit square
    pub base_frequency: f64,
    /// Amplitude multiplier per octave, in (0, 1]
    pub amplitude_falloff: f64,
    /// Noise primitive
    pub kind: NoiseKind,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 8,
            base_frequency: 1.0,
            amplitude_falloff: 0.5,
            kind: NoiseKind::Simplex,
        }
    }
}

impl NoiseConfig {
    pub fn new(seed: u32, octaves: u32) -> Self {
        Self {
            seed,
            octaves,
            ..Self::default()
        }
    }

    /// Same field parameters with a different seed.
    pub fn with_seed(&self, seed: u32) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// `field` names the config in error messages ("elevation", "moisture").
    pub fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.octaves == 0 || self.octaves > MAX_OCTAVES {
            return Err(ConfigError::InvalidOctaves {
                field,
                octaves: self.octaves,
                max: MAX_OCTAVES,
            });
        }
        if !(self.base_frequency.is_finite() && self.base_frequency > 0.0) {
            return Err(ConfigError::InvalidFrequency {
                field,
                value: self.base_frequency,
            });
        }
        if !(self.amplitude_falloff > 0.0 && self.amplitude_falloff <= 1.0) {
            return Err(ConfigError::InvalidFalloff {
                field,
                value: self.amplitude_falloff,
            });
        }
        Ok(())
    }
}

/// Mapping from the raw fractal sum to an elevation in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquashPolicy {
    /// `raw / 2 + 0.5`. Assumes the sum is roughly centred in [-1, 1].
    #[default]
    LinearRescale,
    /// `1 / (1 + e^raw)`, strictly inside (0, 1) for any finite sum.
    Logistic,
    /// Divide by the total octave amplitude first, then rescale linearly into [0, 1].
    NormalizedRescale,
}

impl SquashPolicy {
    pub fn all() -> &'static [Self] {
        &[Self::LinearRescale, Self::Logistic, Self::NormalizedRescale]
    }

    /// Parse from string (for CLI)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" | "linear-rescale" | "rescale" => Some(Self::LinearRescale),
            "logistic" | "sigmoid" => Some(Self::Logistic),
            "normalized" | "normalized-rescale" => Some(Self::NormalizedRescale),
            _ => None,
        }
    }

    /// Squash a raw fractal sum. `amplitude_sum` is the sum of the octave
    /// amplitudes that produced it.
    pub fn apply(self, raw: f64, amplitude_sum: f64) -> f64 {
        match self {
            Self::LinearRescale => raw / 2.0 + 0.5,
            Self::Logistic => {
                // e^raw overflows or vanishes for |raw| past ~37; keep the open interval
                (1.0 / (1.0 + raw.exp())).clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON)
            }
            // Simplex may overshoot [-1, 1] by a hair
            Self::NormalizedRescale => ((raw / amplitude_sum) / 2.0 + 0.5).clamp(0.0, 1.0),
        }
    }
}

impl std::fmt::Display for SquashPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LinearRescale => write!(f, "linear-rescale"),
            Self::Logistic => write!(f, "logistic"),
            Self::NormalizedRescale => write!(f, "normalized-rescale"),
        }
    }
}

/// Range of land fractions considered a usable map. Both bounds are exclusive
/// when tested.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceBand {
    pub min_fraction: f64,
    pub max_fraction: f64,
}

impl AcceptanceBand {
    pub fn new(min_fraction: f64, max_fraction: f64) -> Result<Self, ConfigError> {
        let band = Self {
            min_fraction,
            max_fraction,
        };
        band.validate()?;
        Ok(band)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = self.min_fraction >= 0.0
            && self.max_fraction <= 1.0
            && self.min_fraction < self.max_fraction;
        if !valid {
            return Err(ConfigError::InvalidBand {
                min: self.min_fraction,
                max: self.max_fraction,
            });
        }
        Ok(())
    }

    pub fn contains(&self, land_fraction: f64) -> bool {
        self.min_fraction < land_fraction && land_fraction < self.max_fraction
    }
}

/// How many maps the controller may generate before giving up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Acceptance band. `None` means single-shot: the first map is returned.
    pub band: Option<AcceptanceBand>,
    /// Attempt cap. `None` retries until the band is hit or the deadline passes.
    pub max_attempts: Option<u32>,
    /// Wall-clock budget for the whole run, in milliseconds
    pub deadline_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            band: None,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            deadline_ms: None,
        }
    }
}

impl RetryPolicy {
    pub fn single_shot() -> Self {
        Self::default()
    }

    /// Retry until `band` is satisfied, at most `max_attempts` times.
    pub fn until(band: AcceptanceBand, max_attempts: Option<u32>) -> Self {
        Self {
            band: Some(band),
            max_attempts,
            deadline_ms: None,
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(band) = &self.band {
            band.validate()?;
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }
}

/// Terrain style presets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TerrainPreset {
    /// Rescaled noise with undersea relief kept, single shot
    #[default]
    Relief,
    /// Logistic squash, flat sea, retried until 75-90% land
    FlatSea,
}

impl TerrainPreset {
    pub fn all() -> &'static [Self] {
        &[Self::Relief, Self::FlatSea]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Relief => "Normalized rescale, undersea relief kept, first map accepted",
            Self::FlatSea => "Logistic squash, ocean flattened to sea level, 75-90% land",
        }
    }

    /// Parse from string (for CLI)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relief" | "default" => Some(Self::Relief),
            "flat-sea" | "flat_sea" | "flatsea" => Some(Self::FlatSea),
            _ => None,
        }
    }
}

impl std::fmt::Display for TerrainPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relief => write!(f, "relief"),
            Self::FlatSea => write!(f, "flat-sea"),
        }
    }
}

/// Everything needed to generate (and if configured, retry) one map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Elevation field
    pub elevation: NoiseConfig,
    /// Optional moisture field
    pub moisture: Option<NoiseConfig>,
    /// Raw sum to elevation mapping
    pub squash: SquashPolicy,
    /// Cells below this elevation are sea
    pub sea_level: f64,
    /// Store exactly `sea_level` for sea cells instead of their elevation
    pub clamp_below_sea_level: bool,
    /// Acceptance band and retry budget
    pub retry: RetryPolicy,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self::from_preset(TerrainPreset::default())
    }
}

impl TerrainParams {
    pub fn from_preset(preset: TerrainPreset) -> Self {
        let base = Self {
            width: 1000,
            height: 1000,
            elevation: NoiseConfig::new(0, 8),
            moisture: Some(NoiseConfig::new(0, 24)),
            squash: SquashPolicy::NormalizedRescale,
            sea_level: 0.4,
            clamp_below_sea_level: false,
            retry: RetryPolicy::single_shot(),
        };

        match preset {
            TerrainPreset::Relief => base,
            TerrainPreset::FlatSea => Self {
                moisture: None,
                squash: SquashPolicy::Logistic,
                sea_level: 0.35,
                clamp_below_sea_level: true,
                retry: RetryPolicy::until(
                    AcceptanceBand {
                        min_fraction: 0.75,
                        max_fraction: 0.9,
                    },
                    Some(DEFAULT_MAX_ATTEMPTS),
                ),
                ..base
            },
        }
    }

    /// Load params from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let contents = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&contents)?;
        params.validate()?;
        Ok(params)
    }

    /// Check every field. Generation refuses to start on the first failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_generation(
            self.width,
            self.height,
            &self.elevation,
            self.moisture.as_ref(),
            self.sea_level,
        )?;
        self.retry.validate()
    }
}

/// Shared by [`TerrainParams::validate`] and the generator entry points.
pub(crate) fn validate_generation(
    width: usize,
    height: usize,
    elevation: &NoiseConfig,
    moisture: Option<&NoiseConfig>,
    sea_level: f64,
) -> Result<(), ConfigError> {
    // The cell count must fit in memory indices
    if width == 0 || height == 0 || width.checked_mul(height).is_none() {
        return Err(ConfigError::InvalidDimensions { width, height });
    }
    elevation.validate("elevation")?;
    if let Some(moisture) = moisture {
        moisture.validate("moisture")?;
    }
    if !sea_level.is_finite() {
        return Err(ConfigError::InvalidSeaLevel(sea_level));
    }
    Ok(())
}
