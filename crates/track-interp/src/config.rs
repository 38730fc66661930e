//! Configuration for trajectory interpolation.

use serde::{Deserialize, Serialize};

/// How the blended field is evaluated at a sample coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpatialMethod {
    /// Barycentric interpolation on a triangulation of the grid.
    #[default]
    Linear,
    /// Value of the nearest grid point.
    Nearest,
}

impl SpatialMethod {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "nearest" => Self::Nearest,
            _ => Self::Linear,
        }
    }
}

impl std::fmt::Display for SpatialMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Nearest => write!(f, "nearest"),
        }
    }
}

/// What a linear query outside the grid's triangulated area returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutsideHull {
    /// The missing marker.
    #[default]
    Missing,
    /// Best-effort value of the nearest grid point.
    Nearest,
}

impl OutsideHull {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "nearest" => Self::Nearest,
            _ => Self::Missing,
        }
    }
}

/// What happens when a sample/variable combination fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Stop the run and return the error.
    #[default]
    Abort,
    /// Store the missing marker for that cell and record the failure.
    MarkMissing,
}

impl ErrorPolicy {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mark_missing" | "missing" => Self::MarkMissing,
            _ => Self::Abort,
        }
    }
}

/// Largest accepted time padding: one leap year.
pub const MAX_TIME_PADDING_HOURS: i64 = 24 * 366;

/// Largest accepted extent padding.
pub const MAX_EXTENT_PADDING_DEGREES: f64 = 180.0;

/// Configuration for the trajectory interpolator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpolatorConfig {
    /// Spatial interpolation method.
    pub spatial_method: SpatialMethod,

    /// Behavior for queries outside the grid.
    pub outside_hull: OutsideHull,

    /// Behavior for failing samples.
    pub on_error: ErrorPolicy,

    /// Hours added on each side of the trajectory's time span when planning
    /// which records to fetch.
    pub time_padding_hours: i64,

    /// Degrees added on each side of the trajectory's extent when planning
    /// which records to fetch.
    pub extent_padding_degrees: f64,
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        Self {
            spatial_method: SpatialMethod::Linear,
            outside_hull: OutsideHull::Missing,
            on_error: ErrorPolicy::Abort,
            time_padding_hours: 1,
            extent_padding_degrees: 1.0,
        }
    }
}

impl InterpolatorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TRACK_SPATIAL_METHOD") {
            config.spatial_method = SpatialMethod::from_str(&val);
        }

        if let Ok(val) = std::env::var("TRACK_OUTSIDE_HULL") {
            config.outside_hull = OutsideHull::from_str(&val);
        }

        if let Ok(val) = std::env::var("TRACK_ON_ERROR") {
            config.on_error = ErrorPolicy::from_str(&val);
        }

        if let Ok(val) = std::env::var("TRACK_TIME_PADDING_HOURS") {
            if let Ok(hours) = val.parse() {
                config.time_padding_hours = hours;
            }
        }

        if let Ok(val) = std::env::var("TRACK_EXTENT_PADDING_DEG") {
            if let Ok(degrees) = val.parse() {
                config.extent_padding_degrees = degrees;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=MAX_TIME_PADDING_HOURS).contains(&self.time_padding_hours) {
            return Err(format!(
                "time_padding_hours must be between 0 and {}",
                MAX_TIME_PADDING_HOURS
            ));
        }

        if !(0.0..=MAX_EXTENT_PADDING_DEGREES).contains(&self.extent_padding_degrees) {
            return Err(format!(
                "extent_padding_degrees must be between 0 and {}",
                MAX_EXTENT_PADDING_DEGREES
            ));
        }

        Ok(())
    }
}
