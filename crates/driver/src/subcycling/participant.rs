use tandem_core::framework::{Assembler, GridVariables, SolutionOf, TimeLoop};

use super::Error;

/// Everything one participant brings to a coupled run.
///
/// Holds the current iterate and the last accepted solution separately: the
/// accepted solution only moves when the substrate accepts a step.
pub struct Participant<A: Assembler, N, T, V> {
    pub(crate) assembler: A,
    pub(crate) newton: N,
    pub(crate) time_loop: T,
    pub(crate) vtk: V,
    pub(crate) solution: SolutionOf<A::Problem>,
    pub(crate) previous: SolutionOf<A::Problem>,
}

impl<A, N, T, V> Participant<A, N, T, V>
where
    A: Assembler,
    T: TimeLoop,
{
    /// Bundles the participant and builds its grid variables from the
    /// initial solution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Framework`] if the grid variables reject `solution`.
    pub fn new(
        mut assembler: A,
        newton: N,
        time_loop: T,
        vtk: V,
        solution: SolutionOf<A::Problem>,
    ) -> Result<Self, Error> {
        assembler
            .grid_variables_mut()
            .init(&solution)
            .map_err(Error::framework)?;
        assembler.set_previous_solution(&solution);

        Ok(Self {
            assembler,
            newton,
            time_loop,
            vtk,
            previous: solution.clone(),
            solution,
        })
    }

    pub fn assembler(&self) -> &A {
        &self.assembler
    }

    pub fn newton(&self) -> &N {
        &self.newton
    }

    pub fn time_loop(&self) -> &T {
        &self.time_loop
    }

    pub fn vtk(&self) -> &V {
        &self.vtk
    }

    /// The current iterate.
    pub fn solution(&self) -> &SolutionOf<A::Problem> {
        &self.solution
    }

    /// The last accepted solution.
    pub fn previous_solution(&self) -> &SolutionOf<A::Problem> {
        &self.previous
    }
}
