use tandem_core::TimeIncrement;
use uom::si::f64::Time;

/// Event emitted by the driver after every coupling iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// The substrate accepted the iteration and the clock moved forward.
    Accepted {
        /// Index of the accepted step, starting at 1.
        step: usize,

        /// Simulated time after the step.
        time: Time,

        /// Step size used.
        dt: TimeIncrement,

        /// Newton iterations of the final solve.
        newton_iterations: usize,

        /// Coupling iterations needed for this step, including the accepted
        /// one.
        sub_iterations: usize,
    },

    /// The substrate asked to repeat the step from the checkpoint.
    RolledBack {
        /// Index of the step being repeated.
        step: usize,

        /// Rollbacks of this step so far, starting at 1.
        sub_iteration: usize,

        newton_iterations: usize,
    },
}

impl Event {
    /// Index of the step this event belongs to.
    #[must_use]
    pub fn step(&self) -> usize {
        match self {
            Event::Accepted { step, .. } | Event::RolledBack { step, .. } => *step,
        }
    }

    #[must_use]
    pub fn newton_iterations(&self) -> usize {
        match self {
            Event::Accepted {
                newton_iterations, ..
            }
            | Event::RolledBack {
                newton_iterations, ..
            } => *newton_iterations,
        }
    }

    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Event::Accepted { .. })
    }
}
