//! The participant parameter file.
//!
//! Groups follow the usual finite-volume framework layout in PascalCase:
//!
//! ```toml
//! [TimeLoop]
//! TEnd = 1.0
//! DtInitial = 0.1
//!
//! [Grid]
//! LowerLeft = [0.0, 0.0]
//! UpperRight = [1.0, 0.5]
//! Cells = [20, 10]
//!
//! [Problem]
//! Name = "solid"
//! InitialTemperature = 300.0
//! Conductivity = 15.0
//! HeatCapacity = 4.0e6
//!
//! [Problem.Boundary]
//! Bottom = { Dirichlet = 350.0 }
//!
//! [Coupling]
//! Participant = "Solid"
//! Mesh = "Solid-Mesh"
//! Read = "Heat-Flux"
//! Write = "Temperature"
//! InterfaceSide = "Top"
//! ```

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;
use tandem_core::Quantity;
use tandem_coupling::{DEFAULT_TOLERANCE, ExchangePolicy};
use tandem_heat::{BoundaryCondition, Material, NewtonConfig, Side};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read parameter file `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed parameter file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid override `{0}`, expected Group.Key=value")]
    Override(String),

    #[error("override `{key}` descends into `{group}`, which is not a group")]
    NotAGroup { key: String, group: String },

    #[error("invalid parameter {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// A `--set Group.Key=value` command-line override.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    path: Vec<String>,
    value: toml::Value,
}

impl FromStr for Override {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, raw) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::Override(s.to_string()))?;

        let path: Vec<String> = key.trim().split('.').map(str::to_string).collect();
        if path.len() < 2 || path.iter().any(String::is_empty) {
            return Err(ConfigError::Override(s.to_string()));
        }

        // Anything that is not a TOML value is taken as a bare string.
        let raw = raw.trim();
        let value = format!("v = {raw}")
            .parse::<toml::Table>()
            .ok()
            .and_then(|mut table| table.remove("v"))
            .unwrap_or_else(|| toml::Value::String(raw.to_string()));

        Ok(Self { path, value })
    }
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.path.join("."), self.value)
    }
}

impl Override {
    fn apply(&self, table: &mut toml::Table) -> Result<(), ConfigError> {
        let Some((key, groups)) = self.path.split_last() else {
            return Err(ConfigError::Override(self.to_string()));
        };

        let mut current = table;
        for group in groups {
            let entry = current
                .entry(group.clone())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            current = entry.as_table_mut().ok_or_else(|| ConfigError::NotAGroup {
                key: self.path.join("."),
                group: group.clone(),
            })?;
        }
        current.insert(key.clone(), self.value.clone());
        Ok(())
    }
}

/// All participant parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Params {
    pub time_loop: TimeLoopParams,
    pub grid: GridParams,
    pub problem: ProblemParams,
    #[serde(default)]
    pub newton: NewtonParams,
    pub coupling: CouplingParams,
    #[serde(default)]
    pub vtk: VtkParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TimeLoopParams {
    #[serde(rename = "TEnd")]
    pub t_end: f64,
    pub dt_initial: f64,
    #[serde(default)]
    pub max_time_step_size: Option<f64>,

    /// Stop after this many accepted steps.
    #[serde(default)]
    pub max_steps: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct GridParams {
    pub lower_left: [f64; 2],
    pub upper_right: [f64; 2],
    pub cells: [usize; 2],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ProblemParams {
    pub name: String,
    pub initial_temperature: f64,
    pub conductivity: f64,
    #[serde(default)]
    pub conductivity_slope: f64,

    /// Defaults to the initial temperature.
    #[serde(default)]
    pub reference_temperature: Option<f64>,

    /// Volumetric heat capacity in J/(m³·K).
    pub heat_capacity: f64,
    #[serde(default)]
    pub source: f64,
    #[serde(default)]
    pub boundary: BoundaryParams,
}

impl ProblemParams {
    #[must_use]
    pub fn material(&self) -> Material {
        Material {
            conductivity: self.conductivity,
            conductivity_slope: self.conductivity_slope,
            reference_temperature: self
                .reference_temperature
                .unwrap_or(self.initial_temperature),
            heat_capacity: self.heat_capacity,
        }
    }
}

/// Boundary conditions of the uncoupled sides; adiabatic if absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct BoundaryParams {
    pub bottom: Option<BoundaryCondition>,
    pub right: Option<BoundaryCondition>,
    pub top: Option<BoundaryCondition>,
    pub left: Option<BoundaryCondition>,
}

impl BoundaryParams {
    #[must_use]
    pub fn get(&self, side: Side) -> Option<BoundaryCondition> {
        match side {
            Side::Bottom => self.bottom,
            Side::Right => self.right,
            Side::Top => self.top,
            Side::Left => self.left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct NewtonParams {
    pub max_steps: usize,
    pub target_steps: usize,
    pub residual_reduction: f64,
    pub max_relative_shift: f64,
}

impl Default for NewtonParams {
    fn default() -> Self {
        let config = NewtonConfig::default();
        Self {
            max_steps: config.max_steps,
            target_steps: config.target_steps,
            residual_reduction: config.residual_reduction,
            max_relative_shift: config.max_relative_shift,
        }
    }
}

impl From<NewtonParams> for NewtonConfig {
    fn from(params: NewtonParams) -> Self {
        NewtonConfig {
            max_steps: params.max_steps,
            target_steps: params.target_steps,
            residual_reduction: params.residual_reduction,
            max_relative_shift: params.max_relative_shift,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CouplingParams {
    pub participant: String,
    pub mesh: String,
    pub read: String,
    pub write: String,
    pub interface_side: Side,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl CouplingParams {
    /// The exchange policy named by `Read` and `Write`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unknown or identical quantities.
    pub fn policy(&self) -> Result<ExchangePolicy, ConfigError> {
        let quantity = |key, name: &str| {
            name.parse::<Quantity>().map_err(|err| ConfigError::Invalid {
                key,
                reason: err.to_string(),
            })
        };
        let read = quantity("Coupling.Read", &self.read)?;
        let write = quantity("Coupling.Write", &self.write)?;

        ExchangePolicy::new(read, write).map_err(|err| ConfigError::Invalid {
            key: "Coupling.Write",
            reason: err.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct VtkParams {
    pub output_directory: PathBuf,
}

impl Default for VtkParams {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
        }
    }
}

impl Params {
    /// Reads a parameter file, applies overrides, and validates the result.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, an
    /// override is malformed, or a parameter is out of range.
    pub fn load(path: &Path, overrides: &[Override]) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, overrides)
    }

    /// Parses parameters from TOML text, applying overrides first.
    ///
    /// # Errors
    ///
    /// See [`Params::load`].
    pub fn from_toml(text: &str, overrides: &[Override]) -> Result<Self, ConfigError> {
        let mut table: toml::Table = toml::from_str(text)?;
        for o in overrides {
            o.apply(&mut table)?;
        }

        let params: Self = toml::Value::Table(table).try_into()?;
        params.validate()?;
        Ok(params)
    }

    /// Checks ranges the types cannot express.
    ///
    /// Grid extents are left to the grid itself.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |key: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be positive, got {value}"),
                })
            }
        };

        positive("TimeLoop.TEnd", self.time_loop.t_end)?;
        positive("TimeLoop.DtInitial", self.time_loop.dt_initial)?;
        if let Some(max_dt) = self.time_loop.max_time_step_size {
            positive("TimeLoop.MaxTimeStepSize", max_dt)?;
        }
        positive("Problem.Conductivity", self.problem.conductivity)?;
        positive("Problem.HeatCapacity", self.problem.heat_capacity)?;
        positive("Coupling.Tolerance", self.coupling.tolerance)?;

        if let Some(condition) = self.problem.boundary.get(self.coupling.interface_side) {
            if condition != BoundaryCondition::Coupled {
                return Err(ConfigError::Invalid {
                    key: "Problem.Boundary",
                    reason: format!(
                        "the {} side is the coupling interface but is given {condition:?}",
                        self.coupling.interface_side
                    ),
                });
            }
        }

        NewtonConfig::from(self.newton)
            .validate()
            .map_err(|err| ConfigError::Invalid {
                key: "Newton",
                reason: err.to_string(),
            })?;
        self.coupling.policy()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    const SOLID: &str = r#"
        [TimeLoop]
        TEnd = 1.0
        DtInitial = 0.1

        [Grid]
        LowerLeft = [0.0, 0.0]
        UpperRight = [1.0, 0.5]
        Cells = [4, 2]

        [Problem]
        Name = "solid"
        InitialTemperature = 300.0
        Conductivity = 15.0
        HeatCapacity = 4.0e6

        [Problem.Boundary]
        Bottom = { Dirichlet = 350.0 }

        [Coupling]
        Participant = "Solid"
        Mesh = "Solid-Mesh"
        Read = "Heat-Flux"
        Write = "Temperature"
        InterfaceSide = "Top"
    "#;

    fn overrides(items: &[&str]) -> Vec<Override> {
        items.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn parses_with_defaults() {
        let params = Params::from_toml(SOLID, &[]).unwrap();

        assert_relative_eq!(params.time_loop.t_end, 1.0);
        assert_eq!(params.grid.cells, [4, 2]);
        assert_eq!(
            params.problem.boundary.get(Side::Bottom),
            Some(BoundaryCondition::Dirichlet(350.0))
        );
        assert_eq!(params.problem.boundary.get(Side::Left), None);
        assert_eq!(params.coupling.interface_side, Side::Top);
        assert_relative_eq!(params.coupling.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(params.newton, NewtonParams::default());
        assert_eq!(params.vtk.output_directory, PathBuf::from("."));
        assert_relative_eq!(params.problem.material().reference_temperature, 300.0);
        assert_eq!(params.coupling.policy().unwrap(), ExchangePolicy::solid_energy());
    }

    #[test]
    fn overrides_replace_and_add_keys() {
        let params = Params::from_toml(
            SOLID,
            &overrides(&[
                "TimeLoop.TEnd=2.5",
                "Newton.MaxSteps=4",
                "Problem.Boundary.Left={ Neumann = 10.0 }",
                "Vtk.OutputDirectory=out/solid",
            ]),
        )
        .unwrap();

        assert_relative_eq!(params.time_loop.t_end, 2.5);
        assert_eq!(params.newton.max_steps, 4);
        assert_eq!(
            params.problem.boundary.get(Side::Left),
            Some(BoundaryCondition::Neumann(10.0))
        );
        assert_eq!(params.vtk.output_directory, PathBuf::from("out/solid"));
    }

    #[test]
    fn malformed_overrides_are_rejected() {
        assert!(matches!(
            "TEnd".parse::<Override>(),
            Err(ConfigError::Override(_))
        ));
        assert!(matches!(
            "TEnd=1.0".parse::<Override>(),
            Err(ConfigError::Override(_))
        ));
        assert!(matches!(
            Params::from_toml(SOLID, &overrides(&["TimeLoop.TEnd.Value=1.0"])),
            Err(ConfigError::NotAGroup { .. })
        ));
    }

    #[test]
    fn coupled_side_cannot_carry_another_condition() {
        let result = Params::from_toml(
            SOLID,
            &overrides(&["Problem.Boundary.Top={ Dirichlet = 280.0 }"]),
        );
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "Problem.Boundary",
                ..
            })
        ));
    }

    #[test]
    fn ranges_are_checked() {
        for (set, key) in [
            ("TimeLoop.DtInitial=0.0", "TimeLoop.DtInitial"),
            ("Problem.Conductivity=-1.0", "Problem.Conductivity"),
            ("Newton.ResidualReduction=2.0", "Newton"),
            ("Coupling.Write=Heat-Flux", "Coupling.Write"),
            ("Coupling.Read=Salinity", "Coupling.Read"),
        ] {
            match Params::from_toml(SOLID, &overrides(&[set])) {
                Err(ConfigError::Invalid { key: got, .. }) => assert_eq!(got, key, "{set}"),
                other => panic!("{set}: expected invalid {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        assert!(matches!(
            Params::from_toml(SOLID, &overrides(&["Grid.Refinement=2"])),
            Err(ConfigError::Parse(_))
        ));
    }
}
