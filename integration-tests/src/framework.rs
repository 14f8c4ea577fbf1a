//! Counting stand-ins for the finite-volume framework.
//!
//! The solution is a plain vector whose first entry counts Newton solves
//! since the last rollback, which makes checkpoint restores observable.

use std::convert::Infallible;

use tandem_core::{
    CouplingClock, Quantity, TimeIncrement, as_seconds,
    framework::{
        Assembler, BoundaryFace, CoupledProblem, FaceIdOf, GridGeometry, GridVariables,
        NewtonReport, NewtonSolver, Problem, TimeLoop, VtkWriter,
    },
};
use uom::si::f64::Time;

/// A unit square whose boundary faces lie on its top and bottom edges.
///
/// Faces `0..n` are on the top edge, `n..2n` on the bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub struct StripGeometry {
    pub dimension: usize,
    pub faces_per_edge: usize,
}

impl GridGeometry for StripGeometry {
    type FaceId = usize;

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn num_dofs(&self) -> usize {
        1
    }

    fn boundary_faces(&self) -> impl Iterator<Item = BoundaryFace<usize>> + '_ {
        let n = self.faces_per_edge;
        (0..2 * n).map(move |index| {
            let x = ((index % n) as f64 + 0.5) / n as f64;
            let y = if index < n { 1.0 } else { 0.0 };
            BoundaryFace {
                index,
                center: vec![x, y],
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct FakeProblem {
    pub geometry: StripGeometry,

    /// Coupling values received per face, most recent last.
    pub received: Vec<(usize, Quantity, f64)>,
}

impl Problem for FakeProblem {
    type Solution = Vec<f64>;
    type GridGeometry = StripGeometry;

    fn name(&self) -> &str {
        "fake"
    }

    fn grid_geometry(&self) -> &StripGeometry {
        &self.geometry
    }

    fn apply_initial_solution(&self, solution: &mut Vec<f64>) {
        solution.fill(0.0);
    }
}

impl CoupledProblem for FakeProblem {
    type Error = Infallible;

    fn set_coupling_data(
        &mut self,
        face: FaceIdOf<Self>,
        quantity: Quantity,
        values: &[f64],
    ) -> Result<(), Infallible> {
        self.received.push((face, quantity, values[0]));
        Ok(())
    }

    fn coupling_data(
        &self,
        face: FaceIdOf<Self>,
        _quantity: Quantity,
        solution: &Vec<f64>,
        out: &mut [f64],
    ) -> Result<(), Infallible> {
        out.fill(solution[0] + face as f64);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FakeVariables {
    /// Mirrors `solution[0]` as of the last `init` or `update`.
    pub value: f64,
    pub inits: usize,
    pub updates: usize,
    pub time_steps: usize,
}

impl GridVariables for FakeVariables {
    type Solution = Vec<f64>;
    type Error = Infallible;

    fn init(&mut self, solution: &Vec<f64>) -> Result<(), Infallible> {
        self.value = solution[0];
        self.inits += 1;
        Ok(())
    }

    fn update(&mut self, solution: &Vec<f64>) -> Result<(), Infallible> {
        self.value = solution[0];
        self.updates += 1;
        Ok(())
    }

    fn advance_time_step(&mut self) {
        self.time_steps += 1;
    }
}

#[derive(Debug, Clone)]
pub struct FakeAssembler {
    pub problem: FakeProblem,
    pub variables: FakeVariables,
    pub previous: Vec<f64>,
    pub previous_sets: usize,
}

impl Assembler for FakeAssembler {
    type Problem = FakeProblem;
    type GridVariables = FakeVariables;

    fn problem(&self) -> &FakeProblem {
        &self.problem
    }

    fn problem_mut(&mut self) -> &mut FakeProblem {
        &mut self.problem
    }

    fn grid_variables(&self) -> &FakeVariables {
        &self.variables
    }

    fn grid_variables_mut(&mut self) -> &mut FakeVariables {
        &mut self.variables
    }

    fn set_previous_solution(&mut self, solution: &Vec<f64>) {
        self.previous.clone_from(solution);
        self.previous_sets += 1;
    }
}

/// Adds one to `solution[0]` per solve and always suggests the same step.
#[derive(Debug, Clone)]
pub struct FakeNewton {
    pub suggestion: f64,
    pub iterations: usize,
    pub solves: usize,
}

impl NewtonSolver<FakeAssembler> for FakeNewton {
    type Error = Infallible;

    fn solve<T: TimeLoop>(
        &mut self,
        assembler: &mut FakeAssembler,
        solution: &mut Vec<f64>,
        _time_loop: &T,
    ) -> Result<NewtonReport, Infallible> {
        solution[0] += 1.0;
        let _ = assembler.grid_variables_mut().update(solution);
        self.solves += 1;
        Ok(NewtonReport {
            iterations: self.iterations,
            residual_reduction: 1e-9,
        })
    }

    fn suggest_time_step_size(&self, hint: TimeIncrement) -> TimeIncrement {
        TimeIncrement::from_seconds(self.suggestion).unwrap_or(hint)
    }
}

/// Records the time and `solution[0]` of every frame.
#[derive(Debug, Clone, Default)]
pub struct RecordingVtk {
    pub frames: Vec<(f64, f64)>,
}

impl RecordingVtk {
    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.frames.iter().map(|(t, _)| *t).collect()
    }
}

impl VtkWriter<Vec<f64>> for RecordingVtk {
    type Error = Infallible;

    fn write(&mut self, time: Time, solution: &Vec<f64>) -> Result<(), Infallible> {
        self.frames.push((as_seconds(time), solution[0]));
        Ok(())
    }
}

/// A [`CouplingClock`] that counts `finalize` calls.
#[derive(Debug, Clone)]
pub struct CountingClock {
    pub inner: CouplingClock,
    pub finalized: usize,
}

impl TimeLoop for CountingClock {
    fn start(&mut self) {
        self.inner.start();
    }

    fn time(&self) -> Time {
        self.inner.time()
    }

    fn time_step_size(&self) -> TimeIncrement {
        self.inner.time_step_size()
    }

    fn set_time_step_size(&mut self, dt: TimeIncrement) {
        self.inner.set_time_step_size(dt);
    }

    fn set_max_time_step_size(&mut self, dt: TimeIncrement) {
        self.inner.set_max_time_step_size(dt);
    }

    fn advance_time_step(&mut self) {
        self.inner.advance_time_step();
    }

    fn time_step_index(&self) -> usize {
        self.inner.time_step_index()
    }

    fn finished(&self) -> bool {
        self.inner.finished()
    }

    fn report_time_step(&mut self) {
        self.inner.report_time_step();
    }

    fn finalize(&mut self) {
        self.finalized += 1;
        self.inner.finalize();
    }
}
