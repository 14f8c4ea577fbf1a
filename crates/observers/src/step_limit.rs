use tandem_core::Observer;

use crate::traits::{CanStopEarly, HasStep};

/// Stops a run once a given number of steps has been accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepLimit {
    max_steps: usize,
}

impl StepLimit {
    #[must_use]
    pub fn new(max_steps: usize) -> Self {
        Self { max_steps }
    }
}

impl<E: HasStep, A: CanStopEarly> Observer<E, A> for StepLimit {
    fn observe(&mut self, event: &E) -> Option<A> {
        (event.is_accepted() && event.step() >= self.max_steps).then(A::stop_early)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tandem_core::{TimeIncrement, seconds};
    use tandem_driver::subcycling::{Action, Event};

    fn accepted(step: usize) -> Event {
        Event::Accepted {
            step,
            time: seconds(0.1 * step as f64),
            dt: TimeIncrement::from_seconds(0.1).unwrap(),
            newton_iterations: 1,
            sub_iterations: 1,
        }
    }

    fn observe(limit: &mut StepLimit, event: &Event) -> Option<Action> {
        limit.observe(event)
    }

    #[test]
    fn stops_on_the_limit_only_for_accepted_steps() {
        let mut limit = StepLimit::new(2);

        assert_eq!(observe(&mut limit, &accepted(1)), None);
        let rollback = Event::RolledBack {
            step: 2,
            sub_iteration: 1,
            newton_iterations: 3,
        };
        assert_eq!(observe(&mut limit, &rollback), None);
        assert_eq!(observe(&mut limit, &accepted(2)), Some(Action::StopEarly));
    }
}
