use uom::si::f64::Time;

use crate::TimeIncrement;

/// The participant's clock.
pub trait TimeLoop {
    /// Starts wall-clock bookkeeping.
    fn start(&mut self);

    /// Current simulated time.
    fn time(&self) -> Time;

    /// Size of the step about to be taken.
    fn time_step_size(&self) -> TimeIncrement;

    /// Sets the next step size, clamped by the maximum step size and the
    /// time left until the end.
    fn set_time_step_size(&mut self, dt: TimeIncrement);

    /// Sets an upper bound on future step sizes.
    fn set_max_time_step_size(&mut self, dt: TimeIncrement);

    /// Moves the clock forward by the current step size.
    fn advance_time_step(&mut self);

    /// Number of accepted steps so far.
    fn time_step_index(&self) -> usize;

    /// Returns `true` once the end time has been reached.
    fn finished(&self) -> bool;

    /// Reports statistics of the step just taken.
    fn report_time_step(&mut self);

    /// Reports run statistics; called once at the end.
    fn finalize(&mut self);
}
