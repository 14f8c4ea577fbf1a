//! Core traits and types for partitioned coupling with `tandem`.
//!
//! This crate defines the shared abstractions the coupling adapter, the
//! sub-cycling driver, observers, and participants build on:
//!
//! - [`framework`]: contracts consumed from the finite-volume framework
//! - [`CouplingSubstrate`]: the contract consumed from the coupling library
//! - [`Quantity`]: surface quantities exchanged across the interface
//! - [`TimeIncrement`] and [`CouplingClock`]: unit-safe time stepping
//! - [`Observer`]: receives driver events and optionally returns actions

mod clock;
pub mod framework;
mod observer;
mod quantity;
mod substrate;
mod time;

pub use clock::CouplingClock;
pub use observer::Observer;
pub use quantity::{Quantity, UnknownQuantity};
pub use substrate::{CouplingAction, CouplingSubstrate, DataId, MeshId, VertexId};
pub use time::{TimeIncrement, TimeIncrementError, as_seconds, seconds};
