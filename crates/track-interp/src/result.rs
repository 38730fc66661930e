//! Interpolated per-variable columns aligned with trajectory samples.

use reanalysis_common::{Variable, VariableMap};

use crate::error::InterpolationError;

/// A sample/variable cell that failed under [`crate::ErrorPolicy::MarkMissing`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFailure {
    pub sample: usize,
    pub variable: Variable,
    pub error: InterpolationError,
}

/// One column per variable, each with one entry per trajectory sample.
///
/// `None` marks a missing value: a masked variable, a missing grid point or
/// a query outside the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedResult {
    len: usize,
    columns: VariableMap<Vec<Option<f64>>>,
    failures: Vec<SampleFailure>,
}

impl InterpolatedResult {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            len,
            columns: VariableMap::from_fn(|_| vec![None; len]),
            failures: Vec::new(),
        }
    }

    pub(crate) fn set(&mut self, variable: Variable, sample: usize, value: Option<f64>) {
        self.columns[variable][sample] = value;
    }

    pub(crate) fn record_failure(&mut self, sample: usize, error: InterpolationError) {
        if let Some(variable) = error.variable() {
            self.failures.push(SampleFailure {
                sample,
                variable,
                error,
            });
        }
    }

    /// Number of trajectory samples.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column(&self, variable: Variable) -> &[Option<f64>] {
        &self.columns[variable]
    }

    /// Look up a column by its output key, e.g. `"temp_2m"`.
    pub fn column_by_key(&self, key: &str) -> Option<&[Option<f64>]> {
        Variable::ALL
            .into_iter()
            .find(|v| v.key() == key)
            .map(|v| self.column(v))
    }

    /// Columns in output order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, &[Option<f64>])> {
        self.columns.iter().map(|(v, col)| (v, col.as_slice()))
    }

    /// Cells that were marked missing because of an error.
    pub fn failures(&self) -> &[SampleFailure] {
        &self.failures
    }

    /// Count of missing cells per variable, in output order.
    pub fn missing_counts(&self) -> VariableMap<usize> {
        VariableMap::from_fn(|v| self.columns[v].iter().filter(|x| x.is_none()).count())
    }

    /// Columns as a JSON object keyed by output key; missing values are
    /// `null`.
    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .iter()
            .map(|(variable, values)| (variable.key().to_string(), serde_json::json!(values)))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }
}
