//! Common types shared across the reanalysis trajectory crates.
//!
//! Everything here is plain data: the closed set of sampled variables and
//! their units, the two spatial grids a dataset can carry, geographic extents
//! and the inclusive time window a dataset is built for.

pub mod bbox;
pub mod grid;
pub mod time;
pub mod variable;

pub use bbox::BoundingBox;
pub use grid::{normalize_longitude, GridDefinition, GridKind, GridMesh, MeshError};
pub use time::{minutes_past_hour, TimeWindow, TimeWindowError};
pub use variable::{Unit, UnknownVariable, Variable, VariableMap};
