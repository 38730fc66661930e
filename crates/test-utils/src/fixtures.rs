//! Common test fixtures for end-to-end scenarios.

use std::sync::Arc;

use gridded_fields::{GridRecord, GriddedFieldSet};
use reanalysis_common::{GridMesh, TimeWindow, Variable};

use crate::generators::{at, base_time, complete_records, hourly_timesteps, regular_mesh};

/// The 2x2 atmosphere grid: latitudes `[1, 0]`, longitudes `[0, 1]`.
pub fn atmosphere_2x2() -> Arc<GridMesh> {
    regular_mesh(&[1.0, 0.0], &[0.0, 1.0])
}

/// A coarser ocean grid enclosing the atmosphere grid, so the two never
/// share coordinates.
pub fn ocean_2x2() -> Arc<GridMesh> {
    regular_mesh(&[2.0, -1.0], &[-1.0, 2.0])
}

/// Value of every synthetic field: linear in time and space.
///
/// At the `(0, 0)` corner the value equals the timestep index, giving the
/// `[0, 1, 2]` series over three hours. Each variable gets its own offset
/// so columns can be told apart.
pub fn linear_value(variable: Variable, t: usize, lon: f64, lat: f64) -> f64 {
    variable.index() as f64 * 1000.0 + t as f64 + 10.0 * lon + 100.0 * lat
}

/// Three hourly timesteps (00, 01, 02) of every variable.
pub fn three_hour_records() -> Vec<GridRecord> {
    complete_records(
        &atmosphere_2x2(),
        Some(&ocean_2x2()),
        &hourly_timesteps(base_time(), 3),
        linear_value,
    )
}

/// Window covering exactly the three hourly timesteps.
pub fn three_hour_window() -> TimeWindow {
    TimeWindow::new(at(0, 0), at(2, 0)).unwrap()
}

/// Field set built from [`three_hour_records`].
pub fn three_hour_field_set() -> GriddedFieldSet {
    GriddedFieldSet::from_records(three_hour_records(), three_hour_window()).unwrap()
}

/// Three hourly timesteps without any sea surface temperature record.
pub fn three_hour_field_set_without_ocean() -> GriddedFieldSet {
    let records = complete_records(
        &atmosphere_2x2(),
        None,
        &hourly_timesteps(base_time(), 3),
        linear_value,
    );
    GriddedFieldSet::from_records(records, three_hour_window()).unwrap()
}
