//! The closed set of variables sampled from the reanalysis.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::GridKind;

/// A variable tracked by the field set.
///
/// Every grid record must map to exactly one of these; there is no
/// catch-all case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    /// 10 m eastward wind component
    UWind10m,
    /// 10 m northward wind component
    VWind10m,
    /// Mean sea level pressure
    MeanSeaLevelPressure,
    /// 2 m air temperature
    Temperature2m,
    /// 2 m dewpoint temperature
    Dewpoint2m,
    /// Sea surface temperature (ocean grid)
    SeaSurfaceTemperature,
}

impl Variable {
    /// All variables, in output column order.
    pub const ALL: [Variable; 6] = [
        Variable::UWind10m,
        Variable::VWind10m,
        Variable::MeanSeaLevelPressure,
        Variable::Temperature2m,
        Variable::Dewpoint2m,
        Variable::SeaSurfaceTemperature,
    ];

    /// Output key used for the interpolated table.
    pub fn key(&self) -> &'static str {
        match self {
            Variable::UWind10m => "uwind_10m",
            Variable::VWind10m => "vwind_10m",
            Variable::MeanSeaLevelPressure => "mslp",
            Variable::Temperature2m => "temp_2m",
            Variable::Dewpoint2m => "dewpoint_2m",
            Variable::SeaSurfaceTemperature => "sst",
        }
    }

    /// Identifier used when requesting the variable from the remote dataset.
    pub fn request_name(&self) -> &'static str {
        match self {
            Variable::UWind10m => "10m_u_component_of_wind",
            Variable::VWind10m => "10m_v_component_of_wind",
            Variable::MeanSeaLevelPressure => "mean_sea_level_pressure",
            Variable::Temperature2m => "2m_temperature",
            Variable::Dewpoint2m => "2m_dewpoint",
            Variable::SeaSurfaceTemperature => "sea_surface_temperature",
        }
    }

    /// Physical unit of the stored values.
    pub fn unit(&self) -> Unit {
        match self {
            Variable::UWind10m | Variable::VWind10m => Unit::MetersPerSecond,
            Variable::MeanSeaLevelPressure => Unit::Pascal,
            Variable::Temperature2m | Variable::Dewpoint2m | Variable::SeaSurfaceTemperature => {
                Unit::Kelvin
            }
        }
    }

    /// The grid this variable is defined on.
    pub fn grid_kind(&self) -> GridKind {
        match self {
            Variable::SeaSurfaceTemperature => GridKind::OceanSurface,
            _ => GridKind::Atmosphere,
        }
    }

    /// Position of this variable in [`Variable::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Classify a record's parameter name.
    ///
    /// Accepts short names (`10u`, `t2m`, ...), request identifiers and the
    /// long GRIB parameter names, which are matched by substring
    /// (`"10 metre U wind component"`) except for sea surface temperature,
    /// which must match exactly.
    pub fn from_parameter_name(name: &str) -> Result<Self, UnknownVariable> {
        let trimmed = name.trim();
        let lower = trimmed.to_ascii_lowercase();

        let by_id = match lower.as_str() {
            "10u" | "u10" | "uwind_10m" | "10m_u_component_of_wind" => Some(Variable::UWind10m),
            "10v" | "v10" | "vwind_10m" | "10m_v_component_of_wind" => Some(Variable::VWind10m),
            "msl" | "mslp" | "mean_sea_level_pressure" => Some(Variable::MeanSeaLevelPressure),
            "2t" | "t2m" | "temp_2m" | "2m_temperature" => Some(Variable::Temperature2m),
            "2d" | "d2m" | "dewpoint_2m" | "2m_dewpoint" | "2m_dewpoint_temperature" => {
                Some(Variable::Dewpoint2m)
            }
            "sst" | "sea_surface_temperature" => Some(Variable::SeaSurfaceTemperature),
            _ => None,
        };
        if let Some(variable) = by_id {
            return Ok(variable);
        }

        if trimmed.contains("10 metre U wind component") {
            Ok(Variable::UWind10m)
        } else if trimmed.contains("10 metre V wind component") {
            Ok(Variable::VWind10m)
        } else if trimmed.contains("Mean sea level pressure") {
            Ok(Variable::MeanSeaLevelPressure)
        } else if trimmed.contains("2 metre temperature") {
            Ok(Variable::Temperature2m)
        } else if trimmed.contains("2 metre dewpoint") {
            Ok(Variable::Dewpoint2m)
        } else if trimmed == "Sea surface temperature" {
            Ok(Variable::SeaSurfaceTemperature)
        } else {
            Err(UnknownVariable(name.to_string()))
        }
    }
}

impl FromStr for Variable {
    type Err = UnknownVariable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_parameter_name(s)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One value per [`Variable`], indexed by the variable itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableMap<T> {
    slots: [T; 6],
}

impl<T> VariableMap<T> {
    /// Build a map by evaluating `f` for every variable in [`Variable::ALL`] order.
    pub fn from_fn(f: impl FnMut(Variable) -> T) -> Self {
        Self {
            slots: Variable::ALL.map(f),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, &T)> {
        Variable::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Variable, &mut T)> {
        Variable::ALL.into_iter().zip(self.slots.iter_mut())
    }

    pub fn map<U>(self, mut f: impl FnMut(Variable, T) -> U) -> VariableMap<U> {
        let mut variables = Variable::ALL.into_iter();
        VariableMap {
            slots: self.slots.map(|value| {
                // ALL and slots have the same length
                let variable = variables.next().unwrap_or(Variable::SeaSurfaceTemperature);
                f(variable, value)
            }),
        }
    }
}

impl<T> Index<Variable> for VariableMap<T> {
    type Output = T;

    fn index(&self, variable: Variable) -> &T {
        &self.slots[variable.index()]
    }
}

impl<T> IndexMut<Variable> for VariableMap<T> {
    fn index_mut(&mut self, variable: Variable) -> &mut T {
        &mut self.slots[variable.index()]
    }
}

/// A parameter name that does not map to any [`Variable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no variable matches parameter name '{0}'")]
pub struct UnknownVariable(pub String);

/// Physical unit tag carried by a gridded variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    MetersPerSecond,
    Pascal,
    Kelvin,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::MetersPerSecond => "m/s",
            Unit::Pascal => "Pa",
            Unit::Kelvin => "K",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
