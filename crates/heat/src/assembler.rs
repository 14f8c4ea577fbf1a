use nalgebra::{DMatrix, DVector};
use tandem_core::framework::Assembler;

use crate::{BoundaryTerm, HeatProblem, HeatVariables};

/// Implicit Euler residual and Jacobian of the heat equation.
///
/// The residual of cell `i` is its energy balance per unit depth,
///
/// ```text
/// r_i = C V (T_i − T_i^old) / Δt + Σ_faces (heat leaving through the face) − s V
/// ```
///
/// with face conductivities taken from the grid variables. The Jacobian
/// freezes those conductivities, so it is exact for constant-conductivity
/// materials.
#[derive(Debug, Clone)]
pub struct HeatAssembler {
    problem: HeatProblem,
    variables: HeatVariables,
    previous: DVector<f64>,
}

impl HeatAssembler {
    #[must_use]
    pub fn new(problem: HeatProblem) -> Self {
        let cells = problem.grid().num_cells();
        let variables = HeatVariables::new(*problem.material(), cells);
        Self {
            problem,
            variables,
            previous: DVector::zeros(cells),
        }
    }

    /// The solution of the last accepted step.
    #[must_use]
    pub fn previous_solution(&self) -> &DVector<f64> {
        &self.previous
    }

    /// Assembles residual and Jacobian at `solution` for a step of `dt`
    /// seconds.
    #[must_use]
    pub fn assemble(&self, solution: &DVector<f64>, dt: f64) -> (DVector<f64>, DMatrix<f64>) {
        let grid = self.problem.grid();
        let n = grid.num_cells();
        let lambda = self.variables.conductivity();
        let volume = grid.cell_volume();
        let storage = self.problem.material().heat_capacity * volume / dt;

        let mut residual = DVector::zeros(n);
        let mut jacobian = DMatrix::zeros(n, n);

        for cell in 0..n {
            residual[cell] += storage * (solution[cell] - self.previous[cell])
                - self.problem.source() * volume;
            jacobian[(cell, cell)] += storage;

            for (neighbor, area, distance) in grid.neighbors(cell) {
                let k = harmonic_mean(lambda[cell], lambda[neighbor]);
                let transmissibility = k * area / distance;
                residual[cell] += transmissibility * (solution[cell] - solution[neighbor]);
                jacobian[(cell, cell)] += transmissibility;
                jacobian[(cell, neighbor)] -= transmissibility;
            }
        }

        for face in 0..grid.num_boundary_faces() {
            let Some(location) = grid.locate(face) else {
                continue;
            };
            let cell = location.cell;
            let area = grid.face_area(location.side);

            match self.problem.boundary_term(face) {
                BoundaryTerm::Temperature(temperature) => {
                    let transmissibility =
                        lambda[cell] * area / grid.half_width(location.side);
                    residual[cell] += transmissibility * (solution[cell] - temperature);
                    jacobian[(cell, cell)] += transmissibility;
                }
                BoundaryTerm::Flux(flux) => residual[cell] -= flux * area,
            }
        }

        (residual, jacobian)
    }
}

impl Assembler for HeatAssembler {
    type Problem = HeatProblem;
    type GridVariables = HeatVariables;

    fn problem(&self) -> &HeatProblem {
        &self.problem
    }

    fn problem_mut(&mut self) -> &mut HeatProblem {
        &mut self.problem
    }

    fn grid_variables(&self) -> &HeatVariables {
        &self.variables
    }

    fn grid_variables_mut(&mut self) -> &mut HeatVariables {
        &mut self.variables
    }

    fn set_previous_solution(&mut self, solution: &DVector<f64>) {
        self.previous.clone_from(solution);
    }
}

fn harmonic_mean(a: f64, b: f64) -> f64 {
    2.0 * a * b / (a + b)
}
