//! Time-then-space interpolation of a field set along a trajectory.

use chrono::{DateTime, Utc};
use gridded_fields::{GriddedFieldSet, GriddedVariable};
use reanalysis_common::{GridDefinition, GridKind, Variable};
use tracing::{debug, info, instrument, warn};

use crate::config::{ErrorPolicy, InterpolatorConfig};
use crate::error::{InterpolationError, Result};
use crate::result::InterpolatedResult;
use crate::spatial::SpatialIndex;
use crate::temporal::TimeBracket;
use crate::trajectory::{SynopticWindow, TrackSample, Trajectory};

/// Samples every variable of a [`GriddedFieldSet`] at each trajectory point.
#[derive(Debug, Clone)]
pub struct TrajectoryInterpolator {
    config: InterpolatorConfig,
}

/// Spatial indexes for the grids used by at least one unmasked variable.
struct GridIndexes {
    atmosphere: Option<SpatialIndex>,
    ocean: Option<SpatialIndex>,
}

impl GridIndexes {
    fn build(field_set: &GriddedFieldSet) -> Self {
        let build = |kind: GridKind| {
            let needed = Variable::ALL
                .iter()
                .any(|v| v.grid_kind() == kind && !field_set.variable(*v).is_masked());
            if !needed {
                return None;
            }
            field_set.grid(kind).map(SpatialIndex::new)
        };
        Self {
            atmosphere: build(GridKind::Atmosphere),
            ocean: build(GridKind::OceanSurface),
        }
    }

    fn get(&self, kind: GridKind) -> Option<&SpatialIndex> {
        match kind {
            GridKind::Atmosphere => self.atmosphere.as_ref(),
            GridKind::OceanSurface => self.ocean.as_ref(),
        }
    }
}

impl TrajectoryInterpolator {
    /// Create an interpolator, rejecting an invalid configuration.
    pub fn new(config: InterpolatorConfig) -> Result<Self> {
        config.validate().map_err(InterpolationError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &InterpolatorConfig {
        &self.config
    }

    /// The time window and area to fetch for `trajectory`.
    pub fn plan(&self, trajectory: &Trajectory) -> Result<SynopticWindow> {
        trajectory.synoptic_window(&self.config)
    }

    /// Interpolate all six variables at every trajectory sample.
    ///
    /// Output columns keep the trajectory's sample order. A masked variable
    /// yields `None` for every sample. Under [`ErrorPolicy::Abort`] the first
    /// usage error is returned; under [`ErrorPolicy::MarkMissing`] the cell
    /// becomes `None` and the error is kept in the result.
    #[instrument(
        skip_all,
        fields(samples = trajectory.len(), timesteps = field_set.timesteps().len())
    )]
    pub fn interpolate(
        &self,
        field_set: &GriddedFieldSet,
        trajectory: &Trajectory,
    ) -> Result<InterpolatedResult> {
        let indexes = GridIndexes::build(field_set);
        let timesteps = field_set.timesteps();
        let mut result = InterpolatedResult::new(trajectory.len());

        for (i, sample) in trajectory.samples().iter().enumerate() {
            let bracket = TimeBracket::locate(timesteps, &sample.time);
            for variable in Variable::ALL {
                let data = field_set.variable(variable);
                let index = indexes.get(variable.grid_kind());
                match self.evaluate(data, index, timesteps, i, sample, bracket) {
                    Ok(value) => result.set(variable, i, value),
                    Err(err) => match self.config.on_error {
                        ErrorPolicy::Abort => {
                            warn!(sample = i, variable = %variable, error = %err, "Interpolation aborted");
                            return Err(err);
                        }
                        ErrorPolicy::MarkMissing => {
                            debug!(sample = i, variable = %variable, error = %err, "Marking sample missing");
                            result.record_failure(i, err);
                        }
                    },
                }
            }
        }

        let missing = result.missing_counts();
        for (variable, count) in missing.iter() {
            debug!(variable = %variable, missing = *count, "Interpolated variable");
        }
        info!(
            samples = result.len(),
            failures = result.failures().len(),
            "Interpolated trajectory"
        );

        Ok(result)
    }

    /// Interpolate one variable along `trajectory` on a caller-chosen grid.
    ///
    /// `grid` replaces the field set's own grid for the variable, for example
    /// a finer mesh the caller regridded to. An unmasked variable with no
    /// grid fails with [`InterpolationError::MissingGrid`]. Under
    /// [`ErrorPolicy::MarkMissing`] failing samples become `None`.
    #[instrument(skip_all, fields(variable = %variable, samples = trajectory.len()))]
    pub fn interpolate_variable(
        &self,
        field_set: &GriddedFieldSet,
        variable: Variable,
        grid: Option<&GridDefinition>,
        trajectory: &Trajectory,
    ) -> Result<Vec<Option<f64>>> {
        let data = field_set.variable(variable);
        let index = match grid {
            Some(grid) if !data.is_masked() => Some(SpatialIndex::new(grid)),
            _ => None,
        };
        let timesteps = field_set.timesteps();

        let mut column = Vec::with_capacity(trajectory.len());
        for (i, sample) in trajectory.samples().iter().enumerate() {
            let bracket = TimeBracket::locate(timesteps, &sample.time);
            match self.evaluate(data, index.as_ref(), timesteps, i, sample, bracket) {
                Ok(value) => column.push(value),
                Err(err) if self.config.on_error == ErrorPolicy::MarkMissing => {
                    debug!(sample = i, error = %err, "Marking sample missing");
                    column.push(None);
                }
                Err(err) => {
                    warn!(sample = i, error = %err, "Interpolation aborted");
                    return Err(err);
                }
            }
        }
        Ok(column)
    }

    fn evaluate(
        &self,
        data: &GriddedVariable,
        index: Option<&SpatialIndex>,
        timesteps: &[DateTime<Utc>],
        sample_index: usize,
        sample: &TrackSample,
        bracket: Option<TimeBracket>,
    ) -> Result<Option<f64>> {
        let variable = data.variable();
        let Some(bracket) = bracket else {
            return Err(InterpolationError::out_of_range(
                variable,
                sample_index,
                sample.time,
                timesteps,
            ));
        };

        if data.is_masked() {
            return Ok(None);
        }

        let index = index.ok_or_else(|| missing_grid(variable, sample_index, sample.time))?;

        let field = bracket
            .apply(|k| data.field(k))
            .ok_or(InterpolationError::FieldSizeMismatch {
                variable,
                expected: index.len() * timesteps.len(),
                actual: data.values().len(),
            })?;
        if field.len() != index.len() {
            return Err(InterpolationError::FieldSizeMismatch {
                variable,
                expected: index.len(),
                actual: field.len(),
            });
        }

        let estimate = index.interpolate(
            &field,
            sample.lon,
            sample.lat,
            self.config.spatial_method,
            self.config.outside_hull,
        );
        Ok(estimate.value())
    }
}

fn missing_grid(variable: Variable, sample: usize, timestamp: DateTime<Utc>) -> InterpolationError {
    InterpolationError::MissingGrid {
        variable,
        grid: variable.grid_kind(),
        sample,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use gridded_fields::GridRecord;
    use reanalysis_common::{GridMesh, TimeWindow};
    use std::sync::Arc;

    fn hour(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    /// Two hourly temperature fields on a 2x2 grid; every other variable is
    /// masked.
    fn temperature_only() -> GriddedFieldSet {
        let mesh = Arc::new(GridMesh::regular(&[1.0, 0.0], &[0.0, 1.0]));
        let records = vec![
            GridRecord::new(hour(0), "2t", vec![0.0, 10.0, 20.0, 30.0], mesh.clone()),
            GridRecord::new(hour(1), "2t", vec![1.0, 11.0, 21.0, 31.0], mesh),
        ];
        GriddedFieldSet::from_records(records, TimeWindow::new(hour(0), hour(1)).unwrap())
            .unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = InterpolatorConfig {
            time_padding_hours: -2,
            ..Default::default()
        };
        let err = TrajectoryInterpolator::new(config).unwrap_err();
        assert!(matches!(err, InterpolationError::InvalidConfig(_)));
    }

    #[test]
    fn test_masked_variables_are_none() {
        let set = temperature_only();
        let track = Trajectory::new(vec![TrackSample::new(
            hour(0) + Duration::minutes(15),
            0.0,
            0.0,
        )])
        .unwrap();
        let interpolator = TrajectoryInterpolator::new(InterpolatorConfig::default()).unwrap();
        let result = interpolator.interpolate(&set, &track).unwrap();

        assert_eq!(result.column(Variable::Temperature2m), &[Some(20.25)]);
        assert_eq!(result.column(Variable::UWind10m), &[None]);
        // no ocean grid, but a masked variable never asks for one
        assert_eq!(result.column(Variable::SeaSurfaceTemperature), &[None]);
        assert!(result.failures().is_empty());
    }

    #[test]
    fn test_only_needed_grids_are_indexed() {
        let set = temperature_only();
        let indexes = GridIndexes::build(&set);
        assert!(indexes.get(GridKind::Atmosphere).is_some());
        assert!(indexes.get(GridKind::OceanSurface).is_none());
    }

    #[test]
    fn test_out_of_range_aborts_or_marks() {
        let set = temperature_only();
        let track = Trajectory::new(vec![
            TrackSample::new(hour(0), 0.5, 0.5),
            TrackSample::new(hour(2), 0.5, 0.5),
        ])
        .unwrap();

        let abort = TrajectoryInterpolator::new(InterpolatorConfig::default()).unwrap();
        let err = abort.interpolate(&set, &track).unwrap_err();
        assert!(matches!(
            err,
            InterpolationError::OutOfRangeTime { sample: 1, .. }
        ));

        let lenient = TrajectoryInterpolator::new(InterpolatorConfig {
            on_error: ErrorPolicy::MarkMissing,
            ..Default::default()
        })
        .unwrap();
        let result = lenient.interpolate(&set, &track).unwrap();
        assert_eq!(result.column(Variable::Temperature2m)[1], None);
        assert!(result.column(Variable::Temperature2m)[0].is_some());
        // one failure per variable for the late sample
        assert_eq!(result.failures().len(), 6);
        assert!(result.failures().iter().all(|f| f.sample == 1));
    }

    #[test]
    fn test_plan_uses_config_padding() {
        let interpolator = TrajectoryInterpolator::new(InterpolatorConfig {
            time_padding_hours: 3,
            extent_padding_degrees: 0.5,
            ..Default::default()
        })
        .unwrap();
        let track = Trajectory::new(vec![TrackSample::new(hour(5), 10.0, 20.0)]).unwrap();
        let planned = interpolator.plan(&track).unwrap();
        assert_eq!(planned.window.start, hour(2));
        assert_eq!(planned.window.end, hour(8));
        assert_eq!(planned.extent.min_lon, 9.5);
        assert_eq!(planned.extent.max_lat, 20.5);
    }

    #[test]
    fn test_variable_without_grid_is_missing_grid() {
        let set = temperature_only();
        let track = Trajectory::new(vec![TrackSample::new(hour(0), 0.5, 0.5)]).unwrap();

        let abort = TrajectoryInterpolator::new(InterpolatorConfig::default()).unwrap();
        let err = abort
            .interpolate_variable(&set, Variable::Temperature2m, None, &track)
            .unwrap_err();
        match err {
            InterpolationError::MissingGrid {
                variable,
                grid,
                sample,
                timestamp,
            } => {
                assert_eq!(variable, Variable::Temperature2m);
                assert_eq!(grid, GridKind::Atmosphere);
                assert_eq!(sample, 0);
                assert_eq!(timestamp, hour(0));
            }
            other => panic!("expected MissingGrid, got {other:?}"),
        }

        let lenient = TrajectoryInterpolator::new(InterpolatorConfig {
            on_error: ErrorPolicy::MarkMissing,
            ..Default::default()
        })
        .unwrap();
        let column = lenient
            .interpolate_variable(&set, Variable::Temperature2m, None, &track)
            .unwrap();
        assert_eq!(column, vec![None]);
    }

    #[test]
    fn test_interpolate_variable_on_supplied_grid() {
        let set = temperature_only();
        let grid = set.grid(GridKind::Atmosphere).cloned();
        let track = Trajectory::new(vec![
            TrackSample::new(hour(0) + Duration::minutes(15), 0.0, 0.0),
            TrackSample::new(hour(1), 1.0, 1.0),
        ])
        .unwrap();
        let interpolator = TrajectoryInterpolator::new(InterpolatorConfig::default()).unwrap();

        let column = interpolator
            .interpolate_variable(&set, Variable::Temperature2m, grid.as_ref(), &track)
            .unwrap();
        assert_eq!(column, vec![Some(20.25), Some(11.0)]);

        // a masked variable needs no grid
        let masked = interpolator
            .interpolate_variable(&set, Variable::Dewpoint2m, None, &track)
            .unwrap();
        assert_eq!(masked, vec![None, None]);
    }

    #[test]
    fn test_supplied_grid_of_wrong_size() {
        let set = temperature_only();
        let small = GridDefinition::new(
            GridKind::Atmosphere,
            Arc::new(GridMesh::regular(&[0.0], &[0.0, 1.0])),
        );
        let track = Trajectory::new(vec![TrackSample::new(hour(0), 0.5, 0.0)]).unwrap();
        let err = TrajectoryInterpolator::new(InterpolatorConfig::default())
            .unwrap()
            .interpolate_variable(&set, Variable::Temperature2m, Some(&small), &track)
            .unwrap_err();
        assert!(matches!(
            err,
            InterpolationError::FieldSizeMismatch {
                expected: 2,
                actual: 4,
                ..
            }
        ));
    }
}
