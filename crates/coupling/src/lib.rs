//! Coupling adapter and interface plumbing for partitioned runs.
//!
//! - [`CouplingAdapter`] wraps a [`CouplingSubstrate`] and translates between
//!   solver-local faces and substrate vertices through an [`IndexMapper`].
//! - [`InterfaceExtractor`] finds the interface faces on a grid.
//! - [`CheckpointStore`] keeps the state an implicit sub-iteration rolls back
//!   to.
//! - [`exchange`] decides which quantities flow in which direction.
//!
//! [`CouplingSubstrate`]: tandem_core::CouplingSubstrate

mod adapter;
mod checkpoint;
mod error;
pub mod exchange;
mod index_map;
mod interface;

pub use adapter::{CouplingAdapter, State, SurfaceBuffer};
pub use checkpoint::{CheckpointError, CheckpointStore};
pub use error::{CouplingError, InterfaceError};
pub use exchange::{DataExchange, ExchangeError, ExchangePolicy};
pub use index_map::IndexMapper;
pub use interface::{BoundarySide, DEFAULT_TOLERANCE, Interface, InterfaceExtractor, extract_where};
