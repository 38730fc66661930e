//! Error types for trajectory interpolation.

use chrono::{DateTime, Utc};
use reanalysis_common::{GridKind, Variable};
use thiserror::Error;

/// Errors raised while interpolating along a trajectory.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    /// Spatial interpolation was requested for a variable whose grid was
    /// never observed.
    #[error("no {grid} grid available for '{variable}' at sample {sample} ({timestamp})")]
    MissingGrid {
        variable: Variable,
        grid: GridKind,
        sample: usize,
        timestamp: DateTime<Utc>,
    },

    /// A sample timestamp has no bracketing pair of timesteps.
    #[error(
        "'{variable}' sample {sample} at {timestamp} is outside the gridded time range {range}"
    )]
    OutOfRangeTime {
        variable: Variable,
        sample: usize,
        timestamp: DateTime<Utc>,
        range: String,
    },

    /// A field does not match the size of its grid.
    #[error("'{variable}' field has {actual} values but its grid has {expected} points")]
    FieldSizeMismatch {
        variable: Variable,
        expected: usize,
        actual: usize,
    },

    /// The trajectory cannot be used.
    #[error("invalid trajectory: {0}")]
    InvalidTrajectory(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    InvalidConfig(String),
}

impl InterpolationError {
    /// Create an OutOfRangeTime error, describing the available range.
    pub fn out_of_range(
        variable: Variable,
        sample: usize,
        timestamp: DateTime<Utc>,
        timesteps: &[DateTime<Utc>],
    ) -> Self {
        let range = match (timesteps.first(), timesteps.last()) {
            (Some(first), Some(last)) => format!("[{}, {}]", first, last),
            _ => "(no timesteps)".to_string(),
        };
        Self::OutOfRangeTime {
            variable,
            sample,
            timestamp,
            range,
        }
    }

    /// The variable this error concerns, if any.
    pub fn variable(&self) -> Option<Variable> {
        match self {
            Self::MissingGrid { variable, .. }
            | Self::OutOfRangeTime { variable, .. }
            | Self::FieldSizeMismatch { variable, .. } => Some(*variable),
            Self::InvalidTrajectory(_) | Self::InvalidConfig(_) => None,
        }
    }
}

/// Result type for interpolation operations.
pub type Result<T> = std::result::Result<T, InterpolationError>;
