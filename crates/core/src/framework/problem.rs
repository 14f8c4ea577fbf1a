use crate::Quantity;

use super::GridGeometry;

/// Type alias for a problem's solution vector.
pub type SolutionOf<P> = <P as Problem>::Solution;

/// Type alias for the face identifier of a problem's grid.
pub type FaceIdOf<P> = <<P as Problem>::GridGeometry as GridGeometry>::FaceId;

/// Initial and boundary conditions of one participant.
pub trait Problem {
    type Solution: Clone;
    type GridGeometry: GridGeometry;

    /// Name used for output files.
    fn name(&self) -> &str;

    fn grid_geometry(&self) -> &Self::GridGeometry;

    /// Overwrites `solution` with the initial condition.
    fn apply_initial_solution(&self, solution: &mut Self::Solution);
}

/// A problem with boundary conditions fed by the coupling interface.
///
/// Coupled boundary conditions read values pushed through
/// [`set_coupling_data`] instead of querying the coupling adapter, so no
/// boundary evaluation can run before the interface is registered.
///
/// [`set_coupling_data`]: CoupledProblem::set_coupling_data
pub trait CoupledProblem: Problem {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Stores the peer's value of `quantity` on an interface face.
    ///
    /// # Errors
    ///
    /// Returns an error if the problem cannot use `quantity` as a boundary
    /// condition or the face is not on its boundary.
    fn set_coupling_data(
        &mut self,
        face: FaceIdOf<Self>,
        quantity: Quantity,
        values: &[f64],
    ) -> Result<(), Self::Error>;

    /// Evaluates `quantity` on an interface face from a solution.
    ///
    /// `out` holds one value per component of `quantity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the problem cannot evaluate `quantity`.
    fn coupling_data(
        &self,
        face: FaceIdOf<Self>,
        quantity: Quantity,
        solution: &Self::Solution,
        out: &mut [f64],
    ) -> Result<(), Self::Error>;
}

/// Derived per-element state rebuilt from a solution.
///
/// Restoring a solution without calling [`update`] leaves the Newton assembly
/// working on stale derived state.
///
/// [`update`]: GridVariables::update
pub trait GridVariables {
    type Solution;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Builds the derived state for the first time.
    ///
    /// # Errors
    ///
    /// Returns an error if `solution` is incompatible with the grid.
    fn init(&mut self, solution: &Self::Solution) -> Result<(), Self::Error>;

    /// Rebuilds the derived state from `solution`.
    ///
    /// # Errors
    ///
    /// Returns an error if `solution` is incompatible with the grid.
    fn update(&mut self, solution: &Self::Solution) -> Result<(), Self::Error>;

    /// Makes the current state the previous time level.
    fn advance_time_step(&mut self);
}
