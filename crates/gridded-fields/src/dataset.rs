//! Construction and queries for [`GriddedFieldSet`].

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reanalysis_common::{GridDefinition, GridKind, GridMesh, TimeWindow, Variable, VariableMap};
use tracing::{debug, info, warn};

use crate::error::{FieldSetError, Result};
use crate::field::{GriddedVariable, MaskReason};
use crate::record::GridRecord;
use crate::source::RecordSource;

/// The validated dataset: a sorted timestep axis, up to two grids and one
/// array per variable.
///
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct GriddedFieldSet {
    window: TimeWindow,
    timesteps: Vec<DateTime<Utc>>,
    atmosphere: Option<GridDefinition>,
    ocean: Option<GridDefinition>,
    variables: VariableMap<GriddedVariable>,
}

impl GriddedFieldSet {
    /// Build a field set from every record valid inside `window`.
    ///
    /// Records outside the window are skipped without being classified. An
    /// unrecognized variable name or a record whose values do not fit its
    /// mesh aborts construction.
    pub fn from_records<I>(records: I, window: TimeWindow) -> Result<Self>
    where
        I: IntoIterator<Item = GridRecord>,
    {
        let mut builder = FieldSetBuilder::new(window);
        for record in records {
            builder.push(record)?;
        }
        Ok(builder.finish())
    }

    /// Build a field set by draining a record source.
    pub fn from_source<S: RecordSource>(mut source: S, window: TimeWindow) -> Result<Self> {
        let mut builder = FieldSetBuilder::new(window);
        while let Some(record) = source.next_record().map_err(FieldSetError::Source)? {
            builder.push(record)?;
        }
        Ok(builder.finish())
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Strictly increasing valid times observed in the window.
    pub fn timesteps(&self) -> &[DateTime<Utc>] {
        &self.timesteps
    }

    /// The grid of the given kind, if any record on it was observed.
    pub fn grid(&self, kind: GridKind) -> Option<&GridDefinition> {
        match kind {
            GridKind::Atmosphere => self.atmosphere.as_ref(),
            GridKind::OceanSurface => self.ocean.as_ref(),
        }
    }

    /// The grid a variable is defined on.
    pub fn grid_for(&self, variable: Variable) -> Option<&GridDefinition> {
        self.grid(variable.grid_kind())
    }

    pub fn variable(&self, variable: Variable) -> &GriddedVariable {
        &self.variables[variable]
    }

    pub fn variables(&self) -> impl Iterator<Item = &GriddedVariable> {
        self.variables.iter().map(|(_, v)| v)
    }

    /// Variables that were masked in full.
    pub fn masked_variables(&self) -> Vec<Variable> {
        self.variables
            .iter()
            .filter(|(_, v)| v.is_masked())
            .map(|(variable, _)| variable)
            .collect()
    }
}

/// Incremental builder used while draining a record stream.
#[derive(Debug)]
pub struct FieldSetBuilder {
    window: TimeWindow,
    seen_times: BTreeSet<DateTime<Utc>>,
    ocean_mesh: Option<Arc<GridMesh>>,
    atmosphere_mesh: Option<Arc<GridMesh>>,
    pending: VariableMap<Vec<(DateTime<Utc>, Vec<f64>)>>,
    skipped: usize,
}

impl FieldSetBuilder {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            seen_times: BTreeSet::new(),
            ocean_mesh: None,
            atmosphere_mesh: None,
            pending: VariableMap::default(),
            skipped: 0,
        }
    }

    /// Add one record. Records outside the window are ignored.
    pub fn push(&mut self, record: GridRecord) -> Result<()> {
        if !self.window.contains(&record.valid_time) {
            self.skipped += 1;
            return Ok(());
        }

        let variable = Variable::from_parameter_name(&record.variable_name).map_err(|source| {
            FieldSetError::UnknownVariable {
                name: record.variable_name.clone(),
                valid_time: record.valid_time,
                source,
            }
        })?;
        record.validate()?;

        self.seen_times.insert(record.valid_time);

        match variable.grid_kind() {
            GridKind::OceanSurface => {
                if self.ocean_mesh.is_none() {
                    debug!(shape = ?record.mesh.shape(), "Captured ocean surface grid");
                    self.ocean_mesh = Some(record.mesh.clone());
                }
            }
            GridKind::Atmosphere => {
                self.atmosphere_mesh = Some(record.mesh.clone());
            }
        }

        self.pending[variable].push((record.valid_time, record.values));
        Ok(())
    }

    /// Align every variable on the timestep axis and mask incomplete ones.
    pub fn finish(self) -> GriddedFieldSet {
        let timesteps: Vec<DateTime<Utc>> = self.seen_times.into_iter().collect();
        let ntimes = timesteps.len();

        let atmosphere = self
            .atmosphere_mesh
            .map(|mesh| GridDefinition::new(GridKind::Atmosphere, mesh));
        let ocean = self
            .ocean_mesh
            .map(|mesh| GridDefinition::new(GridKind::OceanSurface, mesh));

        let variables = self.pending.map(|variable, mut entries| {
            let grid = match variable.grid_kind() {
                GridKind::Atmosphere => atmosphere.as_ref(),
                GridKind::OceanSurface => ocean.as_ref(),
            };
            let Some(grid) = grid else {
                return GriddedVariable::masked(variable, ntimes, (0, 0), MaskReason::NoGrid);
            };
            let shape = grid.shape();

            if entries.len() != ntimes {
                let reason = if entries.is_empty() {
                    MaskReason::NoRecords
                } else {
                    MaskReason::PartialCoverage {
                        found: entries.len(),
                        expected: ntimes,
                    }
                };
                warn!(
                    variable = %variable,
                    found = entries.len(),
                    expected = ntimes,
                    "Variable does not cover every timestep, masking it entirely"
                );
                return GriddedVariable::masked(variable, ntimes, shape, reason);
            }

            entries.sort_by_key(|(valid_time, _)| *valid_time);
            let aligned = entries
                .iter()
                .zip(&timesteps)
                .all(|((valid_time, values), t)| valid_time == t && values.len() == grid.mesh.len());
            if !aligned {
                warn!(
                    variable = %variable,
                    grid = %grid.kind,
                    "Records do not align with timesteps or grid size, masking variable"
                );
                return GriddedVariable::masked(variable, ntimes, shape, MaskReason::Misaligned);
            }

            let fields = entries.into_iter().map(|(_, values)| values).collect();
            GriddedVariable::complete(variable, ntimes, shape, fields)
        });

        let masked: Vec<&str> = variables
            .iter()
            .filter(|(_, v)| v.is_masked())
            .map(|(variable, _)| variable.key())
            .collect();
        info!(
            timesteps = ntimes,
            skipped_records = self.skipped,
            has_ocean_grid = ocean.is_some(),
            masked = ?masked,
            "Built gridded field set"
        );

        GriddedFieldSet {
            window: self.window,
            timesteps,
            atmosphere,
            ocean,
            variables,
        }
    }
}
