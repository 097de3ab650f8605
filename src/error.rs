//! Error types for terrain generation.

use std::time::Duration;

use crate::terrain::GenerationResult;

/// A configuration value that can never produce a map. Raised before any grid
/// is allocated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("grid dimensions must be positive and their product must fit in usize, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("{field}: octaves must be in 1..={max}, got {octaves}")]
    InvalidOctaves { field: &'static str, octaves: u32, max: u32 },

    #[error("{field}: base frequency must be positive and finite, got {value}")]
    InvalidFrequency { field: &'static str, value: f64 },

    #[error("{field}: amplitude falloff must be in (0, 1], got {value}")]
    InvalidFalloff { field: &'static str, value: f64 },

    #[error("sea level must be finite, got {0}")]
    InvalidSeaLevel(f64),

    #[error("acceptance band needs 0 <= min < max <= 1, got ({min}, {max})")]
    InvalidBand { min: f64, max: f64 },

    #[error("max attempts must be at least 1")]
    ZeroAttempts,
}

/// Failure of a generation run.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The acceptance band was never hit. `last` is the final rejected map, which
    /// the caller may still choose to use.
    #[error("no map inside the acceptance band after {attempts} attempts (last land fraction {:.3})", .last.land_fraction)]
    RetryExhausted {
        attempts: u32,
        last: Box<GenerationResult>,
    },

    #[error("deadline of {deadline:?} passed after {attempts} attempts (last land fraction {:.3})", .last.land_fraction)]
    DeadlineExceeded {
        attempts: u32,
        deadline: Duration,
        last: Box<GenerationResult>,
    },
}

impl GenerationError {
    /// The last rejected map, if this error carries one.
    pub fn last_result(&self) -> Option<&GenerationResult> {
        match self {
            Self::InvalidConfig(_) => None,
            Self::RetryExhausted { last, .. } | Self::DeadlineExceeded { last, .. } => Some(last),
        }
    }

    /// Take ownership of the last rejected map.
    pub fn into_last_result(self) -> Option<GenerationResult> {
        match self {
            Self::InvalidConfig(_) => None,
            Self::RetryExhausted { last, .. } | Self::DeadlineExceeded { last, .. } => Some(*last),
        }
    }
}

/// Loading a params file from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
