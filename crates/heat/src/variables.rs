use nalgebra::DVector;
use tandem_core::framework::GridVariables;
use thiserror::Error;

use crate::Material;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("solution has {got} entries, grid has {expected} cells")]
pub struct VariablesError {
    pub expected: usize,
    pub got: usize,
}

/// Per-cell state derived from the temperature field.
///
/// Holds the cell conductivities the assembler uses, for the current iterate
/// and for the previous time level.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatVariables {
    material: Material,
    conductivity: DVector<f64>,
    previous_conductivity: DVector<f64>,
}

impl HeatVariables {
    #[must_use]
    pub fn new(material: Material, cells: usize) -> Self {
        let conductivity = DVector::from_element(cells, material.conductivity);
        Self {
            material,
            previous_conductivity: conductivity.clone(),
            conductivity,
        }
    }

    /// Cell conductivities of the current iterate.
    #[must_use]
    pub fn conductivity(&self) -> &DVector<f64> {
        &self.conductivity
    }

    /// Cell conductivities at the last accepted time level.
    #[must_use]
    pub fn previous_conductivity(&self) -> &DVector<f64> {
        &self.previous_conductivity
    }
}

impl GridVariables for HeatVariables {
    type Solution = DVector<f64>;
    type Error = VariablesError;

    fn init(&mut self, solution: &DVector<f64>) -> Result<(), VariablesError> {
        self.update(solution)?;
        self.previous_conductivity.clone_from(&self.conductivity);
        Ok(())
    }

    fn update(&mut self, solution: &DVector<f64>) -> Result<(), VariablesError> {
        if solution.len() != self.conductivity.len() {
            return Err(VariablesError {
                expected: self.conductivity.len(),
                got: solution.len(),
            });
        }
        let material = self.material;
        self.conductivity = solution.map(|t| material.conductivity_at(t));
        Ok(())
    }

    fn advance_time_step(&mut self) {
        self.previous_conductivity.clone_from(&self.conductivity);
    }
}
