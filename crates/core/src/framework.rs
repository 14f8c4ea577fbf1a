//! Contracts consumed from the finite-volume framework.
//!
//! The coupling core never discretizes anything itself. It drives a
//! participant through these traits:
//!
//! - [`GridGeometry`]: boundary faces with stable indices and centres
//! - [`Problem`] / [`CoupledProblem`]: initial solution and coupling data
//! - [`GridVariables`]: derived state rebuilt from a solution
//! - [`Assembler`]: owns problem and grid variables, tracks the previous
//!   converged solution
//! - [`NewtonSolver`]: non-linear solve and time-step suggestion
//! - [`TimeLoop`]: the participant's clock
//! - [`VtkWriter`]: output at accepted steps

mod geometry;
mod output;
mod problem;
mod solver;
mod time_loop;

pub use geometry::{BoundaryFace, FaceIndex, GridGeometry};
pub use output::VtkWriter;
pub use problem::{CoupledProblem, FaceIdOf, GridVariables, Problem, SolutionOf};
pub use solver::{Assembler, NewtonReport, NewtonSolver};
pub use time_loop::TimeLoop;
