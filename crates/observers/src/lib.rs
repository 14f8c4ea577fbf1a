//! Reusable observers for tandem coupled runs.
//!
//! This crate provides [`Observer`] implementations and capability traits for
//! the drivers in `tandem-driver`.
//!
//! # Modules
//!
//! - [`traits`]: Capability traits for cross-driver observers
//!   ([`HasStep`], [`HasNewtonIterations`], [`CanStopEarly`])
//!
//! # Observers
//!
//! - [`TracingObserver`]: logs accepted steps and rollbacks
//! - [`ConvergenceLog`]: appends convergence metrics to `<name>.log`
//! - [`StepLimit`]: stops after a number of accepted steps
//!
//! [`Observer`]: tandem_core::Observer
//! [`HasStep`]: traits::HasStep
//! [`HasNewtonIterations`]: traits::HasNewtonIterations
//! [`CanStopEarly`]: traits::CanStopEarly

mod convergence_log;
mod step_limit;
mod tracing_observer;
pub mod traits;

pub use convergence_log::ConvergenceLog;
pub use step_limit::StepLimit;
pub use tracing_observer::TracingObserver;
