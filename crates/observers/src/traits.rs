//! Capability traits for reusable observers.
//!
//! These traits abstract over driver-specific event and action types so an
//! observer can be written once and used with any driver that exposes the
//! capability.
//!
//! # Event traits
//!
//! - [`HasStep`]: events that belong to a numbered time step
//! - [`HasNewtonIterations`]: events that report non-linear solver effort
//!
//! # Action traits
//!
//! - [`CanStopEarly`]: actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use tandem_core::Observer;
//! use tandem_observers::traits::{CanStopEarly, HasNewtonIterations};
//!
//! struct StopOnStiffness {
//!     max_iterations: usize,
//! }
//!
//! impl<E: HasNewtonIterations, A: CanStopEarly> Observer<E, A> for StopOnStiffness {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.newton_iterations() > self.max_iterations).then(A::stop_early)
//!     }
//! }
//! ```

use tandem_driver::subcycling;

/// An event that belongs to a numbered time step.
pub trait HasStep {
    /// Returns the step index.
    fn step(&self) -> usize;

    /// Returns `true` if the step was accepted by this event.
    fn is_accepted(&self) -> bool;
}

/// An event that reports the effort of a non-linear solve.
pub trait HasNewtonIterations {
    fn newton_iterations(&self) -> usize;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the driver early.
    fn stop_early() -> Self;
}

impl HasStep for subcycling::Event {
    fn step(&self) -> usize {
        subcycling::Event::step(self)
    }

    fn is_accepted(&self) -> bool {
        subcycling::Event::is_accepted(self)
    }
}

impl HasNewtonIterations for subcycling::Event {
    fn newton_iterations(&self) -> usize {
        subcycling::Event::newton_iterations(self)
    }
}

impl CanStopEarly for subcycling::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
