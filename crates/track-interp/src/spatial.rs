//! Scattered-point interpolation on a reanalysis grid.
//!
//! The grid is triangulated once and the triangles are indexed in an R-tree.
//! A query finds the triangle that contains the point and blends the three
//! vertex values with barycentric weights. Longitudes live in `[0, 360)`; a
//! cell straddling the 0/360 seam is lifted by 360 so it stays a small
//! triangle, and queries are repeated at `lon + 360` to find it.

use reanalysis_common::{normalize_longitude, GridDefinition, GridKind};
use rstar::primitives::GeomWithData;
use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

use crate::config::{OutsideHull, SpatialMethod};

/// Tolerance on barycentric weights when deciding whether a point is inside
/// a triangle. Points on shared edges and vertices belong to both sides.
const INSIDE_EPS: f64 = 1e-9;

/// Twice the signed area below which a triangle is considered degenerate.
const DEGENERATE_AREA: f64 = 1e-12;

/// Outcome of evaluating a field at one coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialEstimate {
    /// A finite or interpolated value.
    Value(f64),
    /// The query hit grid points whose values are missing.
    Missing,
    /// The query lies outside the triangulated area of the grid.
    OutsideHull,
}

impl SpatialEstimate {
    /// The value, with both missing cases folded into `None`.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing | Self::OutsideHull => None,
        }
    }

    fn from_point_value(value: f64) -> Self {
        if value.is_nan() {
            Self::Missing
        } else {
            Self::Value(value)
        }
    }
}

/// A triangle of grid points with corners in normalized (possibly lifted)
/// longitude/latitude space.
#[derive(Debug, Clone)]
struct Triangle {
    vertices: [usize; 3],
    corners: [[f64; 2]; 3],
}

impl Triangle {
    fn new(vertices: [usize; 3], points: &[(f64, f64)]) -> Option<Self> {
        let mut corners = vertices.map(|i| [points[i].0, points[i].1]);
        if corners.iter().any(|c| !c[0].is_finite() || !c[1].is_finite()) {
            return None;
        }

        let min_lon = corners.iter().map(|c| c[0]).fold(f64::INFINITY, f64::min);
        let max_lon = corners.iter().map(|c| c[0]).fold(f64::NEG_INFINITY, f64::max);
        if max_lon - min_lon > 180.0 {
            for corner in corners.iter_mut().filter(|c| c[0] < 180.0) {
                corner[0] += 360.0;
            }
        }

        let triangle = Self { vertices, corners };
        if triangle.doubled_area().abs() < DEGENERATE_AREA {
            return None;
        }
        Some(triangle)
    }

    fn doubled_area(&self) -> f64 {
        let [a, b, c] = self.corners;
        (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])
    }

    /// Barycentric weights of `p`, or `None` if it lies outside.
    fn weights(&self, p: [f64; 2]) -> Option<[f64; 3]> {
        let [a, b, c] = self.corners;
        let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
        let w0 = ((b[1] - c[1]) * (p[0] - c[0]) + (c[0] - b[0]) * (p[1] - c[1])) / det;
        let w1 = ((c[1] - a[1]) * (p[0] - c[0]) + (a[0] - c[0]) * (p[1] - c[1])) / det;
        let w2 = 1.0 - w0 - w1;
        if w0 >= -INSIDE_EPS && w1 >= -INSIDE_EPS && w2 >= -INSIDE_EPS {
            Some([w0, w1, w2])
        } else {
            None
        }
    }
}

impl RTreeObject for Triangle {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let [a, b, c] = self.corners;
        AABB::from_corners(
            [
                a[0].min(b[0]).min(c[0]) - INSIDE_EPS,
                a[1].min(b[1]).min(c[1]) - INSIDE_EPS,
            ],
            [
                a[0].max(b[0]).max(c[0]) + INSIDE_EPS,
                a[1].max(b[1]).max(c[1]) + INSIDE_EPS,
            ],
        )
    }
}

type GridNode = GeomWithData<[f64; 2], usize>;

/// Geometry of one grid, built once and queried for every sample.
pub struct SpatialIndex {
    kind: GridKind,
    npoints: usize,
    triangles: RTree<Triangle>,
    nodes: RTree<GridNode>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("kind", &self.kind)
            .field("npoints", &self.npoints)
            .field("triangles", &self.triangles.size())
            .finish()
    }
}

impl SpatialIndex {
    /// Triangulate a grid and index its triangles and points.
    ///
    /// Each mesh cell `(row, col)..(row + 1, col + 1)` is split along its
    /// diagonal. When the last and first columns are neighbours once
    /// longitudes are normalized (a global grid), the closing cell between
    /// them is triangulated too. Cells with non-finite or collinear corners
    /// are skipped.
    pub fn new(grid: &GridDefinition) -> Self {
        let mesh = &grid.mesh;
        let (nlat, nlon) = mesh.shape();
        let points = mesh.normalized_points();

        let mut triangles = Vec::with_capacity(2 * nlat.saturating_sub(1) * nlon);
        let mut push_cell = |row: usize, col: usize, next_col: usize| {
            let a = mesh.flat_index(row, col);
            let b = mesh.flat_index(row, next_col);
            let c = mesh.flat_index(row + 1, col);
            let d = mesh.flat_index(row + 1, next_col);
            triangles.extend(Triangle::new([a, b, d], &points));
            triangles.extend(Triangle::new([a, d, c], &points));
        };

        let mut closed_rows = 0;
        for row in 0..nlat.saturating_sub(1) {
            for col in 0..nlon.saturating_sub(1) {
                push_cell(row, col, col + 1);
            }
            if wraps_around(&points, nlon, row) && wraps_around(&points, nlon, row + 1) {
                push_cell(row, nlon - 1, 0);
                closed_rows += 1;
            }
        }

        let nodes: Vec<GridNode> = points
            .iter()
            .enumerate()
            .filter(|(_, (lon, lat))| lon.is_finite() && lat.is_finite())
            .map(|(i, &(lon, lat))| GridNode::new([lon, lat], i))
            .collect();

        debug!(
            grid = %grid.kind,
            points = points.len(),
            triangles = triangles.len(),
            closed_rows,
            "Built spatial index"
        );

        Self {
            kind: grid.kind,
            npoints: points.len(),
            triangles: RTree::bulk_load(triangles),
            nodes: RTree::bulk_load(nodes),
        }
    }

    pub fn kind(&self) -> GridKind {
        self.kind
    }

    /// Number of grid points a field on this grid must hold.
    pub fn len(&self) -> usize {
        self.npoints
    }

    pub fn is_empty(&self) -> bool {
        self.npoints == 0
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.size()
    }

    /// Evaluate `values` (one per grid point) at `(lon, lat)`.
    ///
    /// A query landing exactly on a grid point returns that point's value
    /// unchanged. A linear query touching a NaN vertex is `Missing`.
    pub fn interpolate(
        &self,
        values: &[f64],
        lon: f64,
        lat: f64,
        method: SpatialMethod,
        outside_hull: OutsideHull,
    ) -> SpatialEstimate {
        let lon = normalize_longitude(lon);
        if !lon.is_finite() || !lat.is_finite() {
            return SpatialEstimate::Missing;
        }

        match method {
            SpatialMethod::Nearest => self.nearest(values, lon, lat),
            SpatialMethod::Linear => {
                let estimate = self.linear(values, lon, lat);
                match (estimate, outside_hull) {
                    (SpatialEstimate::OutsideHull, OutsideHull::Nearest) => {
                        self.nearest(values, lon, lat)
                    }
                    _ => estimate,
                }
            }
        }
    }

    fn linear(&self, values: &[f64], lon: f64, lat: f64) -> SpatialEstimate {
        if let Some(node) = self.nodes.locate_at_point(&[lon, lat]) {
            return point_value(values, node.data);
        }

        let mut touched_missing = false;
        for query in query_positions(lon, lat) {
            let hits = self
                .triangles
                .locate_in_envelope_intersecting(&AABB::from_point(query));
            for triangle in hits {
                let Some(weights) = triangle.weights(query) else {
                    continue;
                };
                let mut sum = 0.0;
                for (&vertex, weight) in triangle.vertices.iter().zip(weights) {
                    let value = values.get(vertex).copied().unwrap_or(f64::NAN);
                    sum += weight * value;
                }
                if sum.is_nan() {
                    touched_missing = true;
                } else {
                    return SpatialEstimate::Value(sum);
                }
            }
        }

        if touched_missing {
            SpatialEstimate::Missing
        } else {
            SpatialEstimate::OutsideHull
        }
    }

    fn nearest(&self, values: &[f64], lon: f64, lat: f64) -> SpatialEstimate {
        let best = [lon - 360.0, lon, lon + 360.0]
            .into_iter()
            .filter_map(|q| {
                use rstar::PointDistance;
                self.nodes
                    .nearest_neighbor(&[q, lat])
                    .map(|node| (node.distance_2(&[q, lat]), node.data))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));

        match best {
            Some((_, index)) => point_value(values, index),
            None => SpatialEstimate::OutsideHull,
        }
    }
}

/// Angular distance between two normalized longitudes.
fn longitude_gap(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Whether the last point of `row` is a neighbour of its first point, that
/// is, the gap across the mesh edge is no wider than the row's own spacing.
fn wraps_around(points: &[(f64, f64)], nlon: usize, row: usize) -> bool {
    if nlon < 3 {
        return false;
    }
    let row_points = &points[row * nlon..(row + 1) * nlon];
    let widest_step = row_points
        .windows(2)
        .map(|w| longitude_gap(w[0].0, w[1].0))
        .fold(0.0, f64::max);
    let closing = longitude_gap(row_points[nlon - 1].0, row_points[0].0);
    closing > 0.0 && closing <= widest_step * (1.0 + 1e-6)
}

fn point_value(values: &[f64], index: usize) -> SpatialEstimate {
    values
        .get(index)
        .map(|&v| SpatialEstimate::from_point_value(v))
        .unwrap_or(SpatialEstimate::Missing)
}

/// The query itself plus its lifted twin for seam-crossing triangles.
fn query_positions(lon: f64, lat: f64) -> impl Iterator<Item = [f64; 2]> {
    let lifted = (lon < 180.0).then_some([lon + 360.0, lat]);
    std::iter::once([lon, lat]).chain(lifted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reanalysis_common::GridMesh;
    use std::sync::Arc;

    fn grid(lats: &[f64], lons: &[f64]) -> GridDefinition {
        GridDefinition::new(GridKind::Atmosphere, Arc::new(GridMesh::regular(lats, lons)))
    }

    fn linear(index: &SpatialIndex, values: &[f64], lon: f64, lat: f64) -> SpatialEstimate {
        index.interpolate(values, lon, lat, SpatialMethod::Linear, OutsideHull::Missing)
    }

    #[test]
    fn test_triangulation_counts() {
        let index = SpatialIndex::new(&grid(&[2.0, 1.0, 0.0], &[0.0, 1.0, 2.0, 3.0]));
        assert_eq!(index.len(), 12);
        assert_eq!(index.triangle_count(), 2 * 2 * 3);
    }

    #[test]
    fn test_corner_values_are_exact() {
        let index = SpatialIndex::new(&grid(&[1.0, 0.0], &[0.0, 1.0]));
        let values = [0.1, 0.2, 0.3, 0.7];
        assert_eq!(linear(&index, &values, 0.0, 1.0), SpatialEstimate::Value(0.1));
        assert_eq!(linear(&index, &values, 1.0, 1.0), SpatialEstimate::Value(0.2));
        assert_eq!(linear(&index, &values, 0.0, 0.0), SpatialEstimate::Value(0.3));
        assert_eq!(linear(&index, &values, 1.0, 0.0), SpatialEstimate::Value(0.7));
    }

    #[test]
    fn test_linear_field_is_reproduced() {
        let lats = [2.0, 1.0, 0.0];
        let lons = [10.0, 11.0, 12.0];
        let index = SpatialIndex::new(&grid(&lats, &lons));
        let mut values = Vec::new();
        for lat in lats {
            for lon in lons {
                values.push(3.0 * lon - 2.0 * lat + 5.0);
            }
        }

        for (lon, lat) in [(10.25, 0.5), (11.5, 1.75), (11.9, 0.1), (10.0, 1.5)] {
            let expected = 3.0 * lon - 2.0 * lat + 5.0;
            match linear(&index, &values, lon, lat) {
                SpatialEstimate::Value(v) => assert!((v - expected).abs() < 1e-9),
                other => panic!("expected a value at ({lon}, {lat}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_outside_hull() {
        let index = SpatialIndex::new(&grid(&[1.0, 0.0], &[0.0, 1.0]));
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(linear(&index, &values, 5.0, 5.0), SpatialEstimate::OutsideHull);
        assert_eq!(linear(&index, &values, 0.5, 1.5), SpatialEstimate::OutsideHull);

        let fallback = index.interpolate(
            &values,
            5.0,
            5.0,
            SpatialMethod::Linear,
            OutsideHull::Nearest,
        );
        assert_eq!(fallback, SpatialEstimate::Value(2.0));
    }

    #[test]
    fn test_missing_vertex_propagates() {
        let index = SpatialIndex::new(&grid(&[1.0, 0.0], &[0.0, 1.0]));
        let values = [1.0, 2.0, 3.0, f64::NAN];
        // both triangles use the (1, 0) corner
        assert_eq!(linear(&index, &values, 0.5, 0.5), SpatialEstimate::Missing);
        assert_eq!(linear(&index, &values, 1.0, 0.0), SpatialEstimate::Missing);
        // an exact hit on a finite point is still usable
        assert_eq!(linear(&index, &values, 0.0, 0.0), SpatialEstimate::Value(3.0));
    }

    #[test]
    fn test_cells_across_the_seam() {
        // longitudes -1 and 2 normalize to 359 and 2
        let index = SpatialIndex::new(&grid(&[1.0, 0.0], &[-1.0, 2.0]));
        assert_eq!(index.triangle_count(), 2);
        let values = [10.0, 40.0, 10.0, 40.0];

        // value grows by 10 per degree east of 359
        for (lon, expected) in [(0.0, 20.0), (-0.5, 15.0), (359.5, 15.0), (1.0, 30.0)] {
            match linear(&index, &values, lon, 0.5) {
                SpatialEstimate::Value(v) => assert!((v - expected).abs() < 1e-9, "lon {lon}"),
                other => panic!("expected a value at lon {lon}, got {other:?}"),
            }
        }
        assert_eq!(linear(&index, &values, -1.0, 1.0), SpatialEstimate::Value(10.0));
    }

    fn global_lons(start: f64) -> Vec<f64> {
        (0..360).map(|i| start + i as f64).collect()
    }

    #[test]
    fn test_global_grid_is_closed_at_180() {
        let index = SpatialIndex::new(&grid(&[1.0, 0.0], &global_lons(-180.0)));
        assert_eq!(index.triangle_count(), 2 * 360);

        // value equals the raw longitude east of -180, continued past 179
        let values: Vec<f64> = [1.0, 0.0]
            .iter()
            .flat_map(|_| global_lons(-180.0))
            .map(|lon| if lon < 0.0 { lon + 360.0 } else { lon })
            .collect();
        for (lon, expected) in [(179.5, 179.5), (-179.5, 180.5), (10.5, 10.5)] {
            match linear(&index, &values, lon, 0.5) {
                SpatialEstimate::Value(v) => assert!((v - expected).abs() < 1e-9, "lon {lon}"),
                other => panic!("expected a value at lon {lon}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_global_grid_is_closed_at_0() {
        let index = SpatialIndex::new(&grid(&[1.0, 0.0], &global_lons(0.0)));
        let values = vec![280.0; 720];
        for lon in [359.5, -0.25, 0.5] {
            let value = linear(&index, &values, lon, 0.5).value();
            assert!(value.is_some_and(|v| (v - 280.0).abs() < 1e-9), "lon {lon}: {value:?}");
        }
    }

    #[test]
    fn test_regional_grid_is_not_closed() {
        let index = SpatialIndex::new(&grid(&[1.0, 0.0], &[10.0, 11.0, 12.0]));
        assert_eq!(index.triangle_count(), 4);
        let values = [1.0; 6];
        assert_eq!(linear(&index, &values, 100.0, 0.5), SpatialEstimate::OutsideHull);
    }

    #[test]
    fn test_nearest_method() {
        let index = SpatialIndex::new(&grid(&[1.0, 0.0], &[0.0, 1.0]));
        let values = [1.0, 2.0, 3.0, 4.0];
        let nearest = |lon, lat| {
            index.interpolate(&values, lon, lat, SpatialMethod::Nearest, OutsideHull::Missing)
        };
        assert_eq!(nearest(0.1, 0.2), SpatialEstimate::Value(3.0));
        assert_eq!(nearest(0.9, 0.8), SpatialEstimate::Value(2.0));
        // 359.9 is closer to 0 than to 1 across the seam
        assert_eq!(nearest(359.9, 0.0), SpatialEstimate::Value(3.0));
    }

    #[test]
    fn test_empty_grid() {
        let index = SpatialIndex::new(&grid(&[], &[]));
        assert!(index.is_empty());
        assert_eq!(linear(&index, &[], 0.0, 0.0), SpatialEstimate::OutsideHull);
        assert_eq!(
            index.interpolate(&[], 0.0, 0.0, SpatialMethod::Nearest, OutsideHull::Nearest),
            SpatialEstimate::OutsideHull
        );
    }

    #[test]
    fn test_estimate_value() {
        assert_eq!(SpatialEstimate::Value(1.5).value(), Some(1.5));
        assert_eq!(SpatialEstimate::Missing.value(), None);
        assert_eq!(SpatialEstimate::OutsideHull.value(), None);
    }
}
