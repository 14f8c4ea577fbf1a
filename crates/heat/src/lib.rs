//! A reference conjugate-heat-transfer participant for `tandem`.
//!
//! The participant solves transient heat conduction with a nonlinear,
//! temperature-dependent conductivity on a uniform rectangular grid using
//! cell-centred finite volumes and implicit Euler. One side of the domain can
//! be coupled to a peer through temperature and heat flux.
//!
//! [`StandaloneSubstrate`] plays a prescribed peer so the participant can run
//! without a second solver.

mod assembler;
mod grid;
mod newton;
mod problem;
mod standalone;
mod variables;
mod vtk;

pub use assembler::HeatAssembler;
pub use grid::{BoundaryLocation, GridError, RectGrid, Side};
pub use newton::{HeatNewton, NewtonConfig, SolveError};
pub use problem::{BoundaryCondition, HeatProblem, Material, ProblemError};
pub use standalone::{Scheme, StandaloneConfig, StandaloneSubstrate, SubstrateError};
pub use variables::{HeatVariables, VariablesError};
pub use vtk::{LegacyVtkWriter, VtkError};

pub(crate) use problem::BoundaryTerm;
