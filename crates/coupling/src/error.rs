use std::error::Error as StdError;

use tandem_core::{CouplingAction, Quantity};
use thiserror::Error;

/// Errors about the geometry or identity of the coupling interface.
///
/// Face identifiers are carried in their `Debug` rendering so the error stays
/// independent of the grid's face-ID type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterfaceError {
    #[error("no boundary face lies on the coupling interface")]
    EmptyInterface,

    #[error("face {face} is not on the coupling interface")]
    UnknownFace { face: String },

    #[error("face {face} registered twice on the coupling interface")]
    DuplicateFace { face: String },

    #[error("substrate expects {substrate}-D coordinates but the grid is {grid}-D")]
    DimensionMismatch { substrate: usize, grid: usize },

    #[error("{len} coordinates do not describe {vertices} vertices in {dimension}-D")]
    CoordinateLength {
        len: usize,
        vertices: usize,
        dimension: usize,
    },
}

impl InterfaceError {
    pub(crate) fn unknown_face<F: std::fmt::Debug>(face: F) -> Self {
        Self::UnknownFace {
            face: format!("{face:?}"),
        }
    }

    pub(crate) fn duplicate_face<F: std::fmt::Debug>(face: F) -> Self {
        Self::DuplicateFace {
            face: format!("{face:?}"),
        }
    }
}

/// Errors raised by the coupling adapter.
#[derive(Debug, Error)]
pub enum CouplingError {
    #[error("coupling substrate failed")]
    Substrate(#[source] Box<dyn StdError + Send + Sync>),

    #[error(transparent)]
    Interface(#[from] InterfaceError),

    #[error("`{operation}` is not allowed while the adapter is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error(
        "solver already announced as `{announced}` (rank {rank} of {size}), cannot re-announce as `{requested}`"
    )]
    AlreadyAnnounced {
        announced: String,
        requested: String,
        rank: usize,
        size: usize,
    },

    #[error("mesh `{mesh}` already set on this adapter")]
    MeshAlreadySet { mesh: String },

    #[error("action `{action}` was required but not acknowledged before `{operation}`")]
    UnacknowledgedAction {
        action: CouplingAction,
        operation: &'static str,
    },

    #[error("action `{action}` acknowledged but not required")]
    ActionNotRequired { action: CouplingAction },

    #[error("quantity `{quantity}` is not registered on this participant")]
    QuantityNotRegistered { quantity: Quantity },

    #[error("quantity `{quantity}` has {expected} components per face, got {got}")]
    ComponentMismatch {
        quantity: Quantity,
        expected: usize,
        got: usize,
    },

    #[error("substrate returned {got} vertex IDs for {expected} vertices")]
    VertexCount { expected: usize, got: usize },
}

impl CouplingError {
    pub(crate) fn substrate<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Substrate(Box::new(err))
    }
}
