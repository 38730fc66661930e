//! Spatial meshes for reanalysis fields.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Which of the two dataset grids a mesh belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridKind {
    Atmosphere,
    OceanSurface,
}

impl GridKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridKind::Atmosphere => "atmosphere",
            GridKind::OceanSurface => "ocean_surface",
        }
    }
}

impl fmt::Display for GridKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inconsistent mesh dimensions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("{axis} mesh has {actual} points, expected {expected} ({nlat}x{nlon})")]
    SizeMismatch {
        axis: &'static str,
        expected: usize,
        actual: usize,
        nlat: usize,
        nlon: usize,
    },
}

/// A 2-D latitude/longitude mesh of shape `[nlat, nlon]`.
///
/// Coordinates are stored flattened in row-major order, so the point at
/// `(row, col)` lives at `row * nlon + col`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMesh {
    nlat: usize,
    nlon: usize,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

impl GridMesh {
    /// Create a mesh from flattened coordinate arrays.
    pub fn new(
        nlat: usize,
        nlon: usize,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
    ) -> Result<Self, MeshError> {
        let expected = nlat * nlon;
        if latitudes.len() != expected {
            return Err(MeshError::SizeMismatch {
                axis: "latitude",
                expected,
                actual: latitudes.len(),
                nlat,
                nlon,
            });
        }
        if longitudes.len() != expected {
            return Err(MeshError::SizeMismatch {
                axis: "longitude",
                expected,
                actual: longitudes.len(),
                nlat,
                nlon,
            });
        }
        Ok(Self {
            nlat,
            nlon,
            latitudes,
            longitudes,
        })
    }

    /// Build the mesh of a regular grid from its 1-D axes.
    pub fn regular(lats: &[f64], lons: &[f64]) -> Self {
        let mut latitudes = Vec::with_capacity(lats.len() * lons.len());
        let mut longitudes = Vec::with_capacity(lats.len() * lons.len());
        for &lat in lats {
            for &lon in lons {
                latitudes.push(lat);
                longitudes.push(lon);
            }
        }
        Self {
            nlat: lats.len(),
            nlon: lons.len(),
            latitudes,
            longitudes,
        }
    }

    /// Mesh shape as `(nlat, nlon)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nlat, self.nlon)
    }

    pub fn nlat(&self) -> usize {
        self.nlat
    }

    pub fn nlon(&self) -> usize {
        self.nlon
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nlat * self.nlon
    }

    pub fn is_empty(&self) -> bool {
        self.nlat == 0 || self.nlon == 0
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// Flat index of `(row, col)`.
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.nlon + col
    }

    /// Coordinates of every point as `(lon, lat)` with longitudes
    /// normalized into `[0, 360)`.
    pub fn normalized_points(&self) -> Vec<(f64, f64)> {
        self.longitudes
            .iter()
            .zip(&self.latitudes)
            .map(|(&lon, &lat)| (normalize_longitude(lon), lat))
            .collect()
    }

    /// Bounding box of the raw (un-normalized) coordinates.
    pub fn bbox(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (&lon, &lat) in self.longitudes.iter().zip(&self.latitudes) {
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.max_lon = bbox.max_lon.max(lon);
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lat = bbox.max_lat.max(lat);
        }
        bbox
    }
}

/// A mesh tagged with the grid it represents.
///
/// The mesh is shared, since every record on a grid carries the same one.
#[derive(Debug, Clone, PartialEq)]
pub struct GridDefinition {
    pub kind: GridKind,
    pub mesh: Arc<GridMesh>,
}

impl GridDefinition {
    pub fn new(kind: GridKind, mesh: Arc<GridMesh>) -> Self {
        Self { kind, mesh }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.mesh.shape()
    }
}

/// Map a longitude into `[0, 360)`.
///
/// Values already in range are returned unchanged, so `-10.0` becomes
/// `350.0` and `350.0` stays `350.0`.
pub fn normalize_longitude(lon: f64) -> f64 {
    if (0.0..360.0).contains(&lon) {
        return lon;
    }
    let wrapped = lon.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
