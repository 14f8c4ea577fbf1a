//! Which quantities a participant reads and writes, and how they reach its
//! boundary conditions.
//!
//! A policy pulls inbound values out of the adapter's buffers into the problem
//! before the solve, and evaluates outbound values from the converged solution
//! into the adapter after it. Boundary conditions only ever see the values a
//! policy pushed, so they cannot run before the interface exists.

use std::error::Error as StdError;

use tandem_core::{
    CouplingSubstrate, Quantity,
    framework::{CoupledProblem, FaceIdOf, SolutionOf},
};
use thiserror::Error;

use crate::{CouplingAdapter, CouplingError};

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Coupling(#[from] CouplingError),

    #[error("problem rejected `{quantity}` on face {face}")]
    Problem {
        quantity: Quantity,
        face: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("a participant cannot read and write the same quantity `{quantity}`")]
    SameQuantity { quantity: Quantity },
}

impl ExchangeError {
    fn problem<F, E>(quantity: Quantity, face: F, err: E) -> Self
    where
        F: std::fmt::Debug,
        E: StdError + Send + Sync + 'static,
    {
        Self::Problem {
            quantity,
            face: format!("{face:?}"),
            source: Box::new(err),
        }
    }
}

/// Hooks the driver calls around every solve.
pub trait DataExchange {
    /// Reads inbound data from the peer and pushes it into the problem.
    ///
    /// Returns `false` if nothing was read.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter or the problem fails.
    fn before_solve<S, P>(
        &self,
        adapter: &mut CouplingAdapter<S, FaceIdOf<P>>,
        problem: &mut P,
    ) -> Result<bool, ExchangeError>
    where
        S: CouplingSubstrate,
        P: CoupledProblem;

    /// Evaluates outbound data on `solution` and sends it to the peer.
    ///
    /// Returns `false` if nothing was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter or the problem fails.
    fn after_solve<S, P>(
        &self,
        adapter: &mut CouplingAdapter<S, FaceIdOf<P>>,
        problem: &P,
        solution: &SolutionOf<P>,
    ) -> Result<bool, ExchangeError>
    where
        S: CouplingSubstrate,
        P: CoupledProblem;
}

/// Reads one quantity and writes another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangePolicy {
    read: Quantity,
    write: Quantity,
}

impl ExchangePolicy {
    /// # Errors
    ///
    /// Returns [`ExchangeError::SameQuantity`] if `read == write`.
    pub fn new(read: Quantity, write: Quantity) -> Result<Self, ExchangeError> {
        if read == write {
            return Err(ExchangeError::SameQuantity { quantity: read });
        }
        Ok(Self { read, write })
    }

    /// A heat-conducting solid: receives the fluid's heat flux, returns its
    /// wall temperature.
    #[must_use]
    pub fn solid_energy() -> Self {
        Self {
            read: Quantity::HeatFlux,
            write: Quantity::Temperature,
        }
    }

    /// The fluid side of conjugate heat transfer.
    #[must_use]
    pub fn free_flow_energy() -> Self {
        Self {
            read: Quantity::Temperature,
            write: Quantity::HeatFlux,
        }
    }

    /// A porous medium: receives the free-flow velocity, returns its
    /// pressure.
    #[must_use]
    pub fn darcy() -> Self {
        Self {
            read: Quantity::Velocity,
            write: Quantity::Pressure,
        }
    }

    /// The free-flow side of Stokes/Darcy coupling.
    #[must_use]
    pub fn free_flow_momentum() -> Self {
        Self {
            read: Quantity::Pressure,
            write: Quantity::Velocity,
        }
    }

    #[must_use]
    pub fn read(&self) -> Quantity {
        self.read
    }

    #[must_use]
    pub fn write(&self) -> Quantity {
        self.write
    }

    /// Returns `true` if `other` writes what `self` reads and vice versa.
    #[must_use]
    pub fn is_dual_of(&self, other: &Self) -> bool {
        self.read == other.write && self.write == other.read
    }
}

impl DataExchange for ExchangePolicy {
    fn before_solve<S, P>(
        &self,
        adapter: &mut CouplingAdapter<S, FaceIdOf<P>>,
        problem: &mut P,
    ) -> Result<bool, ExchangeError>
    where
        S: CouplingSubstrate,
        P: CoupledProblem,
    {
        let quantity = self.read;
        if !adapter.read_from_other_solver(quantity)? {
            return Ok(false);
        }

        for face in adapter.interface_faces() {
            let values = adapter.value_on_face(quantity, face)?;
            problem
                .set_coupling_data(face, quantity, values)
                .map_err(|err| ExchangeError::problem(quantity, face, err))?;
        }
        Ok(true)
    }

    fn after_solve<S, P>(
        &self,
        adapter: &mut CouplingAdapter<S, FaceIdOf<P>>,
        problem: &P,
        solution: &SolutionOf<P>,
    ) -> Result<bool, ExchangeError>
    where
        S: CouplingSubstrate,
        P: CoupledProblem,
    {
        let quantity = self.write;
        if !adapter.is_registered(quantity) {
            return Ok(false);
        }

        let mut values = vec![0.0; adapter.buffer(quantity)?.components()];
        let faces: Vec<_> = adapter.interface_faces().collect();
        for face in faces {
            problem
                .coupling_data(face, quantity, solution, &mut values)
                .map_err(|err| ExchangeError::problem(quantity, face, err))?;
            adapter.write_value_on_face(quantity, face, &values)?;
        }

        Ok(adapter.write_to_other_solver(quantity)?)
    }
}
