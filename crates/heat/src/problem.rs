use nalgebra::DVector;
use serde::Deserialize;
use tandem_core::{
    Quantity,
    framework::{CoupledProblem, Problem},
};
use thiserror::Error;

use crate::{RectGrid, Side};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProblemError {
    #[error("face {face} is not a boundary face of the grid")]
    UnknownFace { face: usize },

    #[error("face {face} lies on the {side} side, which is not coupled")]
    NotCoupled { face: usize, side: Side },

    #[error("heat conduction cannot exchange `{quantity}`")]
    UnsupportedQuantity { quantity: Quantity },

    #[error("expected {expected} value(s) for `{quantity}`, got {got}")]
    ValueCount {
        quantity: Quantity,
        expected: usize,
        got: usize,
    },

    #[error("solution has {got} entries, grid has {expected} cells")]
    SolutionSize { expected: usize, got: usize },
}

/// Boundary condition on one side of the domain.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum BoundaryCondition {
    /// Fixed temperature in K.
    Dirichlet(f64),

    /// Heat flux into the domain in W/m².
    Neumann(f64),

    /// Fed by the coupling interface.
    Coupled,
}

/// Thermal properties of the conducting medium.
///
/// Conductivity varies linearly with temperature,
/// `λ(T) = λ₀ · (1 + β · (T − T_ref))`, clamped to stay positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// `λ₀` in W/(m·K).
    pub conductivity: f64,

    /// `β` in 1/K.
    pub conductivity_slope: f64,

    /// `T_ref` in K.
    pub reference_temperature: f64,

    /// Density times specific heat in J/(m³·K).
    pub heat_capacity: f64,
}

impl Material {
    /// A material with constant conductivity.
    #[must_use]
    pub fn constant(conductivity: f64, heat_capacity: f64) -> Self {
        Self {
            conductivity,
            conductivity_slope: 0.0,
            reference_temperature: 0.0,
            heat_capacity,
        }
    }

    #[must_use]
    pub fn conductivity_at(&self, temperature: f64) -> f64 {
        let factor = 1.0 + self.conductivity_slope * (temperature - self.reference_temperature);
        self.conductivity * factor.max(1e-3)
    }
}

/// What a boundary face contributes to its cell's energy balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BoundaryTerm {
    /// Face held at a temperature.
    Temperature(f64),

    /// Heat flux into the domain.
    Flux(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CouplingValue {
    HeatFlux(f64),
    Temperature(f64),
}

/// Transient heat conduction on a rectangle.
///
/// Coupled sides take whatever the peer sends: a received temperature acts as
/// a Dirichlet condition, a received heat flux as a Neumann condition. Before
/// anything arrives a coupled side is adiabatic.
///
/// Exchanged heat flux is positive from the writer into the reader: a
/// participant writes the flux leaving its domain and reads the flux
/// entering it.
#[derive(Debug, Clone)]
pub struct HeatProblem {
    name: String,
    grid: RectGrid,
    material: Material,
    initial_temperature: f64,
    source: f64,
    boundaries: [BoundaryCondition; 4],
    coupled: Vec<Option<CouplingValue>>,
}

impl HeatProblem {
    /// Creates a problem with every side adiabatic.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        grid: RectGrid,
        material: Material,
        initial_temperature: f64,
    ) -> Self {
        let faces = grid.num_boundary_faces();
        Self {
            name: name.into(),
            grid,
            material,
            initial_temperature,
            source: 0.0,
            boundaries: [BoundaryCondition::Neumann(0.0); 4],
            coupled: vec![None; faces],
        }
    }

    #[must_use]
    pub fn with_boundary(mut self, side: Side, condition: BoundaryCondition) -> Self {
        self.boundaries[side.index()] = condition;
        self
    }

    /// Volumetric heat source in W/m³.
    #[must_use]
    pub fn with_source(self, source: f64) -> Self {
        Self { source, ..self }
    }

    #[must_use]
    pub fn grid(&self) -> &RectGrid {
        &self.grid
    }

    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    #[must_use]
    pub fn source(&self) -> f64 {
        self.source
    }

    #[must_use]
    pub fn boundary(&self, side: Side) -> BoundaryCondition {
        self.boundaries[side.index()]
    }

    /// Face temperature implied by the boundary condition and the adjacent
    /// cell temperature.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::UnknownFace`] for a non-boundary face.
    pub fn face_temperature(
        &self,
        face: usize,
        solution: &DVector<f64>,
    ) -> Result<f64, ProblemError> {
        let location = self
            .grid
            .locate(face)
            .ok_or(ProblemError::UnknownFace { face })?;
        let cell_temperature = cell_value(solution, location.cell, self.grid.num_cells())?;
        let lambda = self.material.conductivity_at(cell_temperature);
        let distance = self.grid.half_width(location.side);

        Ok(match self.boundary_term(face) {
            BoundaryTerm::Temperature(temperature) => temperature,
            BoundaryTerm::Flux(flux) => cell_temperature + flux * distance / lambda,
        })
    }

    /// Heat flux leaving the domain through a boundary face.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::UnknownFace`] for a non-boundary face.
    pub fn outward_heat_flux(
        &self,
        face: usize,
        solution: &DVector<f64>,
    ) -> Result<f64, ProblemError> {
        let location = self
            .grid
            .locate(face)
            .ok_or(ProblemError::UnknownFace { face })?;
        let cell_temperature = cell_value(solution, location.cell, self.grid.num_cells())?;

        Ok(match self.boundary_term(face) {
            BoundaryTerm::Flux(flux) => -flux,
            BoundaryTerm::Temperature(temperature) => {
                let lambda = self.material.conductivity_at(cell_temperature);
                lambda * (cell_temperature - temperature) / self.grid.half_width(location.side)
            }
        })
    }

    /// Boundary term of a face known to lie on the grid boundary.
    pub(crate) fn boundary_term(&self, face: usize) -> BoundaryTerm {
        let Some(location) = self.grid.locate(face) else {
            return BoundaryTerm::Flux(0.0);
        };
        match self.boundary(location.side) {
            BoundaryCondition::Dirichlet(temperature) => BoundaryTerm::Temperature(temperature),
            BoundaryCondition::Neumann(flux) => BoundaryTerm::Flux(flux),
            BoundaryCondition::Coupled => match self.coupled[face] {
                Some(CouplingValue::Temperature(temperature)) => {
                    BoundaryTerm::Temperature(temperature)
                }
                Some(CouplingValue::HeatFlux(flux)) => BoundaryTerm::Flux(flux),
                None => BoundaryTerm::Flux(0.0),
            },
        }
    }

    fn coupled_side(&self, face: usize) -> Result<Side, ProblemError> {
        let location = self
            .grid
            .locate(face)
            .ok_or(ProblemError::UnknownFace { face })?;
        match self.boundary(location.side) {
            BoundaryCondition::Coupled => Ok(location.side),
            _ => Err(ProblemError::NotCoupled {
                face,
                side: location.side,
            }),
        }
    }
}

impl Problem for HeatProblem {
    type Solution = DVector<f64>;
    type GridGeometry = RectGrid;

    fn name(&self) -> &str {
        &self.name
    }

    fn grid_geometry(&self) -> &RectGrid {
        &self.grid
    }

    fn apply_initial_solution(&self, solution: &mut DVector<f64>) {
        *solution = DVector::from_element(self.grid.num_cells(), self.initial_temperature);
    }
}

impl CoupledProblem for HeatProblem {
    type Error = ProblemError;

    fn set_coupling_data(
        &mut self,
        face: usize,
        quantity: Quantity,
        values: &[f64],
    ) -> Result<(), ProblemError> {
        self.coupled_side(face)?;
        let value = single_value(quantity, values)?;
        self.coupled[face] = Some(match quantity {
            Quantity::HeatFlux => CouplingValue::HeatFlux(value),
            Quantity::Temperature => CouplingValue::Temperature(value),
            Quantity::Pressure | Quantity::Velocity => {
                return Err(ProblemError::UnsupportedQuantity { quantity });
            }
        });
        Ok(())
    }

    fn coupling_data(
        &self,
        face: usize,
        quantity: Quantity,
        solution: &DVector<f64>,
        out: &mut [f64],
    ) -> Result<(), ProblemError> {
        self.coupled_side(face)?;
        if out.len() != 1 {
            return Err(ProblemError::ValueCount {
                quantity,
                expected: 1,
                got: out.len(),
            });
        }
        out[0] = match quantity {
            Quantity::Temperature => self.face_temperature(face, solution)?,
            Quantity::HeatFlux => self.outward_heat_flux(face, solution)?,
            Quantity::Pressure | Quantity::Velocity => {
                return Err(ProblemError::UnsupportedQuantity { quantity });
            }
        };
        Ok(())
    }
}

fn single_value(quantity: Quantity, values: &[f64]) -> Result<f64, ProblemError> {
    match values {
        [value] => Ok(*value),
        _ => Err(ProblemError::ValueCount {
            quantity,
            expected: 1,
            got: values.len(),
        }),
    }
}

fn cell_value(solution: &DVector<f64>, cell: usize, cells: usize) -> Result<f64, ProblemError> {
    if solution.len() != cells {
        return Err(ProblemError::SolutionSize {
            expected: cells,
            got: solution.len(),
        });
    }
    Ok(solution[cell])
}
