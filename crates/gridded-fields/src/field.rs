//! Per-variable `[T, nlat, nlon]` arrays with a unit tag and coverage mask.

use reanalysis_common::{Unit, Variable};

/// Why a variable was masked in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskReason {
    /// No record for this variable fell inside the window.
    NoRecords,
    /// Records exist for some timesteps but not all of them.
    PartialCoverage { found: usize, expected: usize },
    /// Records do not line up one-to-one with the timesteps, or disagree
    /// with the size of the variable's grid.
    Misaligned,
    /// The grid this variable lives on was never observed.
    NoGrid,
}

/// Whether a variable's data is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    /// One field per timestep.
    Complete,
    /// Every value is invalid.
    Masked(MaskReason),
}

/// A single variable's time series over its grid.
///
/// Values are flattened as `[t][row][col]`. A masked variable keeps its full
/// shape and holds NaN everywhere.
#[derive(Debug, Clone)]
pub struct GriddedVariable {
    variable: Variable,
    unit: Unit,
    shape: [usize; 3],
    values: Vec<f64>,
    coverage: Coverage,
}

impl GriddedVariable {
    /// Stack per-timestep fields. The caller guarantees every field holds
    /// `nlat * nlon` values.
    pub(crate) fn complete(
        variable: Variable,
        ntimes: usize,
        (nlat, nlon): (usize, usize),
        fields: Vec<Vec<f64>>,
    ) -> Self {
        let mut values = Vec::with_capacity(ntimes * nlat * nlon);
        for field in fields {
            values.extend(field);
        }
        Self {
            variable,
            unit: variable.unit(),
            shape: [ntimes, nlat, nlon],
            values,
            coverage: Coverage::Complete,
        }
    }

    pub(crate) fn masked(
        variable: Variable,
        ntimes: usize,
        (nlat, nlon): (usize, usize),
        reason: MaskReason,
    ) -> Self {
        Self {
            variable,
            unit: variable.unit(),
            shape: [ntimes, nlat, nlon],
            values: vec![f64::NAN; ntimes * nlat * nlon],
            coverage: Coverage::Masked(reason),
        }
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// `[T, nlat, nlon]`
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    pub fn is_masked(&self) -> bool {
        matches!(self.coverage, Coverage::Masked(_))
    }

    /// All values, flattened `[t][row][col]`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The 2-D field at timestep index `t`, or `None` if out of range.
    pub fn field(&self, t: usize) -> Option<&[f64]> {
        let [ntimes, nlat, nlon] = self.shape;
        if t >= ntimes {
            return None;
        }
        let len = nlat * nlon;
        self.values.get(t * len..(t + 1) * len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_field_slices() {
        let var = GriddedVariable::complete(
            Variable::Temperature2m,
            2,
            (1, 2),
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        );
        assert_eq!(var.shape(), [2, 1, 2]);
        assert_eq!(var.unit(), Unit::Kelvin);
        assert_eq!(var.field(0), Some(&[1.0, 2.0][..]));
        assert_eq!(var.field(1), Some(&[3.0, 4.0][..]));
        assert_eq!(var.field(2), None);
        assert!(!var.is_masked());
    }

    #[test]
    fn test_masked_keeps_shape() {
        let var = GriddedVariable::masked(
            Variable::UWind10m,
            3,
            (2, 2),
            MaskReason::PartialCoverage {
                found: 2,
                expected: 3,
            },
        );
        assert!(var.is_masked());
        assert_eq!(var.shape(), [3, 2, 2]);
        assert_eq!(var.values().len(), 12);
        assert!(var.values().iter().all(|v| v.is_nan()));
        assert_eq!(var.unit(), Unit::MetersPerSecond);
    }
}
