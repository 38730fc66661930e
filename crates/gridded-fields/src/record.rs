//! Decoded grid records, the input unit of a field set.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reanalysis_common::GridMesh;

use crate::error::{FieldSetError, Result};

/// One decoded field: a single variable at a single valid time over a mesh.
///
/// `values` is flattened row-major in the mesh's `[nlat, nlon]` layout.
/// Missing points (e.g. SST over land) are NaN.
#[derive(Debug, Clone)]
pub struct GridRecord {
    pub valid_time: DateTime<Utc>,
    pub variable_name: String,
    pub values: Vec<f64>,
    pub mesh: Arc<GridMesh>,
}

impl GridRecord {
    pub fn new(
        valid_time: DateTime<Utc>,
        variable_name: impl Into<String>,
        values: Vec<f64>,
        mesh: Arc<GridMesh>,
    ) -> Self {
        Self {
            valid_time,
            variable_name: variable_name.into(),
            values,
            mesh,
        }
    }

    /// Check that the value count matches the mesh.
    pub fn validate(&self) -> Result<()> {
        if self.values.len() != self.mesh.len() {
            let (nlat, nlon) = self.mesh.shape();
            return Err(FieldSetError::malformed(
                &self.variable_name,
                self.valid_time,
                format!(
                    "{} values for a {}x{} mesh ({} points)",
                    self.values.len(),
                    nlat,
                    nlon,
                    self.mesh.len()
                ),
            ));
        }
        Ok(())
    }
}
