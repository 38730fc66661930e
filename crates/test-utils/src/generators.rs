//! Generators for synthetic reanalysis-like data.
//!
//! Fields are produced from closures of `(timestep index, lon, lat)` so
//! tests can compute the exact expected value at any point.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use gridded_fields::GridRecord;
use reanalysis_common::{GridMesh, Variable};

/// Midnight of the reference day used throughout the tests.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
}

/// `base_time()` plus `hour` hours and `minute` minutes.
pub fn at(hour: i64, minute: i64) -> DateTime<Utc> {
    base_time() + Duration::hours(hour) + Duration::minutes(minute)
}

/// `count` consecutive hourly timestamps starting at `start`.
pub fn hourly_timesteps(start: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
    (0..count)
        .map(|h| start + Duration::hours(h as i64))
        .collect()
}

/// `n` evenly spaced values starting at `start`.
///
/// # Example
///
/// ```
/// use test_utils::axis;
///
/// assert_eq!(axis(10.0, -0.5, 3), vec![10.0, 9.5, 9.0]);
/// ```
pub fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// A shared regular mesh from its latitude and longitude axes.
pub fn regular_mesh(lats: &[f64], lons: &[f64]) -> Arc<GridMesh> {
    Arc::new(GridMesh::regular(lats, lons))
}

/// Long GRIB parameter name of a variable, as the decoder reports it.
pub fn grib_parameter_name(variable: Variable) -> &'static str {
    match variable {
        Variable::UWind10m => "10 metre U wind component",
        Variable::VWind10m => "10 metre V wind component",
        Variable::MeanSeaLevelPressure => "Mean sea level pressure",
        Variable::Temperature2m => "2 metre temperature",
        Variable::Dewpoint2m => "2 metre dewpoint temperature",
        Variable::SeaSurfaceTemperature => "Sea surface temperature",
    }
}

/// Evaluate `f(lon, lat)` at every point of `mesh`.
pub fn field_from_fn(mesh: &GridMesh, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    mesh.longitudes()
        .iter()
        .zip(mesh.latitudes())
        .map(|(&lon, &lat)| f(lon, lat))
        .collect()
}

/// One record per timestep for a single parameter name.
pub fn records_for(
    name: &str,
    mesh: &Arc<GridMesh>,
    times: &[DateTime<Utc>],
    f: impl Fn(usize, f64, f64) -> f64,
) -> Vec<GridRecord> {
    times
        .iter()
        .enumerate()
        .map(|(t, &valid_time)| {
            let values = field_from_fn(mesh, |lon, lat| f(t, lon, lat));
            GridRecord::new(valid_time, name, values, mesh.clone())
        })
        .collect()
}

/// Records for every variable at every timestep, interleaved by time the
/// way a decoded file lists them.
///
/// Sea surface temperature uses `ocean_mesh` and is left out when it is
/// `None`.
pub fn complete_records(
    atmosphere_mesh: &Arc<GridMesh>,
    ocean_mesh: Option<&Arc<GridMesh>>,
    times: &[DateTime<Utc>],
    f: impl Fn(Variable, usize, f64, f64) -> f64,
) -> Vec<GridRecord> {
    let mut records = Vec::new();
    for (t, &valid_time) in times.iter().enumerate() {
        for variable in Variable::ALL {
            let mesh = match variable {
                Variable::SeaSurfaceTemperature => match ocean_mesh {
                    Some(mesh) => mesh,
                    None => continue,
                },
                _ => atmosphere_mesh,
            };
            let values = field_from_fn(mesh, |lon, lat| f(variable, t, lon, lat));
            records.push(GridRecord::new(
                valid_time,
                grib_parameter_name(variable),
                values,
                mesh.clone(),
            ));
        }
    }
    records
}
