use crate::TimeIncrement;

use super::{GridVariables, Problem, SolutionOf, TimeLoop};

/// Residual assembly for one participant.
///
/// The assembler owns the problem and the grid variables, like the
/// framework's assembler holds shared handles to them.
pub trait Assembler {
    type Problem: Problem;
    type GridVariables: GridVariables<Solution = SolutionOf<Self::Problem>>;

    fn problem(&self) -> &Self::Problem;

    fn problem_mut(&mut self) -> &mut Self::Problem;

    fn grid_variables(&self) -> &Self::GridVariables;

    fn grid_variables_mut(&mut self) -> &mut Self::GridVariables;

    /// Sets the previous converged solution used for storage terms.
    fn set_previous_solution(&mut self, solution: &SolutionOf<Self::Problem>);
}

/// Statistics of one non-linear solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonReport {
    /// Newton iterations performed.
    pub iterations: usize,

    /// Final residual norm relative to the initial one.
    pub residual_reduction: f64,
}

/// The non-linear solver of one participant.
pub trait NewtonSolver<A: Assembler> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Solves the non-linear system for the time loop's current step.
    ///
    /// # Errors
    ///
    /// Returns an error if the iteration diverges or does not converge.
    fn solve<T: TimeLoop>(
        &mut self,
        assembler: &mut A,
        solution: &mut SolutionOf<A::Problem>,
        time_loop: &T,
    ) -> Result<NewtonReport, Self::Error>;

    /// Suggests the next step size given the last solve's effort.
    fn suggest_time_step_size(&self, hint: TimeIncrement) -> TimeIncrement;
}
