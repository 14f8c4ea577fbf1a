use tandem_core::{Observer, as_seconds};
use tandem_driver::subcycling::{Action, Event};

/// Logs every coupling iteration through `tracing`.
///
/// Accepted steps are logged at `INFO`, rollbacks at `DEBUG`. The observer
/// never acts.
#[derive(Debug, Clone, Default)]
pub struct TracingObserver {
    problem: String,
}

impl TracingObserver {
    #[must_use]
    pub fn new(problem: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
        }
    }
}

impl Observer<Event, Action> for TracingObserver {
    fn observe(&mut self, event: &Event) -> Option<Action> {
        match *event {
            Event::Accepted {
                step,
                time,
                dt,
                newton_iterations,
                sub_iterations,
            } => tracing::info!(
                problem = %self.problem,
                step,
                time = as_seconds(time),
                dt = dt.seconds(),
                newton_iterations,
                sub_iterations,
                "step accepted"
            ),
            Event::RolledBack {
                step,
                sub_iteration,
                newton_iterations,
            } => tracing::debug!(
                problem = %self.problem,
                step,
                sub_iteration,
                newton_iterations,
                "step rolled back to checkpoint"
            ),
        }
        None
    }
}
