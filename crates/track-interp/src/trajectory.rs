//! Trajectories and the data window they need.

use chrono::{DateTime, Utc};
use reanalysis_common::{BoundingBox, TimeWindow};
use serde::{Deserialize, Serialize};

use crate::config::InterpolatorConfig;
use crate::error::{InterpolationError, Result};

/// One position of the moving object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    pub time: DateTime<Utc>,
    /// Degrees east; any convention, normalized when queried.
    pub lon: f64,
    pub lat: f64,
}

impl TrackSample {
    pub fn new(time: DateTime<Utc>, lon: f64, lat: f64) -> Self {
        Self { time, lon, lat }
    }
}

/// An ordered sequence of samples. Order is preserved in the output; it
/// need not be chronological.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    samples: Vec<TrackSample>,
}

/// The time window and area a trajectory needs from the reanalysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynopticWindow {
    pub window: TimeWindow,
    pub extent: BoundingBox,
}

impl Trajectory {
    /// Validate and wrap samples. Coordinates must be finite and latitudes
    /// within `[-90, 90]`.
    pub fn new(samples: Vec<TrackSample>) -> Result<Self> {
        for (i, sample) in samples.iter().enumerate() {
            if !sample.lon.is_finite() || !sample.lat.is_finite() {
                return Err(InterpolationError::InvalidTrajectory(format!(
                    "sample {} at {} has non-finite coordinates ({}, {})",
                    i, sample.time, sample.lon, sample.lat
                )));
            }
            if !(-90.0..=90.0).contains(&sample.lat) {
                return Err(InterpolationError::InvalidTrajectory(format!(
                    "sample {} at {} has latitude {} outside [-90, 90]",
                    i, sample.time, sample.lat
                )));
            }
        }
        Ok(Self { samples })
    }

    /// Build from parallel time, longitude and latitude columns.
    pub fn from_columns(times: &[DateTime<Utc>], lons: &[f64], lats: &[f64]) -> Result<Self> {
        if times.len() != lons.len() || times.len() != lats.len() {
            return Err(InterpolationError::InvalidTrajectory(format!(
                "column lengths differ: {} times, {} longitudes, {} latitudes",
                times.len(),
                lons.len(),
                lats.len()
            )));
        }
        let samples = times
            .iter()
            .zip(lons.iter().zip(lats))
            .map(|(&time, (&lon, &lat))| TrackSample::new(time, lon, lat))
            .collect();
        Self::new(samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[TrackSample] {
        &self.samples
    }

    /// Earliest to latest sample time.
    pub fn time_span(&self) -> Option<TimeWindow> {
        let start = self.samples.iter().map(|s| s.time).min()?;
        let end = self.samples.iter().map(|s| s.time).max()?;
        Some(TimeWindow { start, end })
    }

    /// Bounding box of the sample coordinates as given.
    pub fn extent(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.samples.iter().map(|s| (s.lon, s.lat)))
    }

    /// Time span and extent padded by the configured margins.
    pub fn synoptic_window(&self, config: &InterpolatorConfig) -> Result<SynopticWindow> {
        let (Some(span), Some(extent)) = (self.time_span(), self.extent()) else {
            return Err(InterpolationError::InvalidTrajectory(
                "cannot plan a window for an empty trajectory".to_string(),
            ));
        };
        let window = span
            .padded(config.time_padding_hours)
            .map_err(|e| InterpolationError::InvalidConfig(e.to_string()))?;
        Ok(SynopticWindow {
            window,
            extent: extent.expand(config.extent_padding_degrees),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 9, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_from_columns() {
        let times = [t0(), t0() + Duration::minutes(30)];
        let track = Trajectory::from_columns(&times, &[-70.0, -69.5], &[41.0, 41.2]).unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.samples()[1], TrackSample::new(times[1], -69.5, 41.2));

        let err = Trajectory::from_columns(&times, &[-70.0], &[41.0, 41.2]).unwrap_err();
        assert!(matches!(err, InterpolationError::InvalidTrajectory(_)));
    }

    #[test]
    fn test_rejects_bad_coordinates() {
        let nan = Trajectory::new(vec![TrackSample::new(t0(), f64::NAN, 0.0)]);
        assert!(nan.is_err());
        let polar = Trajectory::new(vec![TrackSample::new(t0(), 0.0, 91.0)]);
        assert!(polar.is_err());
        assert!(Trajectory::new(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_synoptic_window() {
        let track = Trajectory::new(vec![
            TrackSample::new(t0() + Duration::hours(5), -68.0, 40.0),
            TrackSample::new(t0(), -70.5, 41.5),
        ])
        .unwrap();
        let planned = track.synoptic_window(&InterpolatorConfig::default()).unwrap();

        assert_eq!(planned.window.start, t0() - Duration::hours(1));
        assert_eq!(planned.window.end, t0() + Duration::hours(6));
        assert_eq!(planned.extent, BoundingBox::new(-71.5, 39.0, -67.0, 42.5));
    }

    #[test]
    fn test_unrepresentable_padding_is_an_error() {
        let track = Trajectory::new(vec![TrackSample::new(t0(), 0.0, 0.0)]).unwrap();
        let config = InterpolatorConfig {
            time_padding_hours: i64::MAX / 2,
            ..Default::default()
        };
        let err = track.synoptic_window(&config).unwrap_err();
        assert!(matches!(err, InterpolationError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_trajectory_has_no_window() {
        let err = Trajectory::default()
            .synoptic_window(&InterpolatorConfig::default())
            .unwrap_err();
        assert!(matches!(err, InterpolationError::InvalidTrajectory(_)));
    }
}
