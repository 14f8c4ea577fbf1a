use uom::si::f64::Time;

/// Indicates how the coupled run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The participant's clock reached its end time.
    Finished,

    /// The substrate ended the coupling first.
    CouplingEnded,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// Summary of a coupled run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// How the run terminated.
    pub status: Status,

    /// Steps accepted by the substrate.
    pub accepted_steps: usize,

    /// Iterations rolled back to a checkpoint.
    pub rollbacks: usize,

    /// Non-linear solves performed, accepted or not.
    pub newton_solves: usize,

    /// Simulated time at the end of the run.
    pub final_time: Time,
}
