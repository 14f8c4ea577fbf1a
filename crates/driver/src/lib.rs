//! Drivers that advance one participant of a partitioned simulation.
//!
//! - [`subcycling`]: the coupled time loop: implicit sub-iterations with
//!   checkpoint and rollback, and time-step negotiation with the substrate.

pub mod subcycling;
