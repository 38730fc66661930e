//! Geographic extents.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Smallest box enclosing every `(lon, lat)` point, or `None` if there
    /// are no points.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (lon, lat) = iter.next()?;
        let mut bbox = Self::new(lon, lat, lon, lat);
        for (lon, lat) in iter {
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.max_lon = bbox.max_lon.max(lon);
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lat = bbox.max_lat.max(lat);
        }
        Some(bbox)
    }

    /// Get the width in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Get the height in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if a point is contained within this bounding box.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Expand the bounding box by a buffer amount (in degrees).
    pub fn expand(&self, buffer: f64) -> Self {
        Self {
            min_lon: self.min_lon - buffer,
            min_lat: self.min_lat - buffer,
            max_lon: self.max_lon + buffer,
            max_lat: self.max_lat + buffer,
        }
    }

    /// Area as `[north, west, south, east]`, the order retrieval requests use.
    pub fn to_nwse(&self) -> [f64; 4] {
        [self.max_lat, self.min_lon, self.min_lat, self.max_lon]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let bbox = BoundingBox::from_points([(-70.5, 40.0), (-68.0, 41.5), (-69.0, 39.0)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(-70.5, 39.0, -68.0, 41.5));
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_expand_and_dimensions() {
        let bbox = BoundingBox::new(-100.0, 30.0, -90.0, 40.0).expand(1.0);
        assert_eq!(bbox, BoundingBox::new(-101.0, 29.0, -89.0, 41.0));
        assert!((bbox.width() - 12.0).abs() < f64::EPSILON);
        assert!((bbox.height() - 12.0).abs() < f64::EPSILON);
        assert!(bbox.contains(-95.0, 35.0));
        assert!(!bbox.contains(-105.0, 35.0));
    }

    #[test]
    fn test_to_nwse() {
        let bbox = BoundingBox::new(-71.0, 38.0, -67.0, 42.0);
        assert_eq!(bbox.to_nwse(), [42.0, -71.0, 38.0, -67.0]);
    }
}
