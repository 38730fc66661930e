//! Sampling gridded reanalysis fields along a moving trajectory.
//!
//! Each trajectory sample is handled on its own: the gridded time series is
//! first blended between the two bracketing hours, then the blended field is
//! interpolated at the sample's exact coordinate.
//!
//! # Architecture
//!
//! ```text
//! TrajectoryInterpolator::interpolate(field_set, trajectory)
//!      │
//!      ├─► SpatialIndex per grid (built once: triangles + R-tree)
//!      │
//!      └─► for each sample, for each variable
//!               │
//!               ├─► TimeBracket::locate(timesteps, t)   exact | between k, k+1
//!               ├─► blend field[k], field[k+1]           full 2-D field
//!               └─► SpatialIndex::interpolate(lon, lat)  barycentric / nearest
//!                        │
//!                        ▼
//!               InterpolatedResult[variable][sample]
//! ```
//!
//! # Example
//!
//! ```ignore
//! use track_interp::{InterpolatorConfig, Trajectory, TrajectoryInterpolator};
//!
//! let interpolator = TrajectoryInterpolator::new(InterpolatorConfig::from_env())?;
//! let result = interpolator.interpolate(&field_set, &trajectory)?;
//! let sst = result.column(Variable::SeaSurfaceTemperature);
//! ```

pub mod config;
pub mod error;
pub mod interpolator;
pub mod result;
pub mod spatial;
pub mod temporal;
pub mod trajectory;

pub use config::{ErrorPolicy, InterpolatorConfig, OutsideHull, SpatialMethod};
pub use error::{InterpolationError, Result};
pub use interpolator::TrajectoryInterpolator;
pub use result::{InterpolatedResult, SampleFailure};
pub use spatial::{SpatialEstimate, SpatialIndex};
pub use temporal::{blend_fields, TimeBracket};
pub use trajectory::{SynopticWindow, TrackSample, Trajectory};
