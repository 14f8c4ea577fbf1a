use std::time::{Duration, Instant};

use uom::si::f64::Time;

use crate::{
    TimeIncrement,
    framework::TimeLoop,
    time::as_seconds,
};

/// Relative tolerance on the end time, scaled by the simulated interval.
const END_TIME_EPS: f64 = 1e-10;

/// The shipped [`TimeLoop`]: current time plus proposed step size.
///
/// The proposed step is clamped by the user's maximum step size and by the
/// time remaining until `end`, so the final step lands on `end` exactly.
#[derive(Debug, Clone)]
pub struct CouplingClock {
    start: Time,
    end: Time,
    time: Time,
    dt: TimeIncrement,
    max_dt: Option<TimeIncrement>,
    step_index: usize,
    started_at: Option<Instant>,
    step_started_at: Option<Instant>,
    last_step_wall_time: Duration,
}

impl CouplingClock {
    /// Creates a clock running from `start` to `end` with an initial step.
    #[must_use]
    pub fn new(start: Time, dt: TimeIncrement, end: Time) -> Self {
        let mut clock = Self {
            start,
            end,
            time: start,
            dt,
            max_dt: None,
            step_index: 0,
            started_at: None,
            step_started_at: None,
            last_step_wall_time: Duration::ZERO,
        };
        clock.set_time_step_size(dt);
        clock
    }

    /// End of the simulated interval.
    #[must_use]
    pub fn end_time(&self) -> Time {
        self.end
    }

    /// Largest step the clock currently accepts, or `None` once finished.
    #[must_use]
    pub fn max_time_step_size(&self) -> Option<TimeIncrement> {
        let remaining = TimeIncrement::from_time(self.end - self.time).ok()?;
        Some(match self.max_dt {
            Some(max_dt) => max_dt.min(remaining),
            None => remaining,
        })
    }

    /// Wall-clock time spent since [`TimeLoop::start`].
    #[must_use]
    pub fn wall_clock_time(&self) -> Duration {
        self.started_at.map_or(Duration::ZERO, |t| t.elapsed())
    }
}

impl TimeLoop for CouplingClock {
    fn start(&mut self) {
        let now = Instant::now();
        self.started_at = Some(now);
        self.step_started_at = Some(now);
    }

    fn time(&self) -> Time {
        self.time
    }

    fn time_step_size(&self) -> TimeIncrement {
        self.dt
    }

    fn set_time_step_size(&mut self, dt: TimeIncrement) {
        self.dt = match self.max_time_step_size() {
            Some(max_dt) => dt.min(max_dt),
            None => dt,
        };
    }

    fn set_max_time_step_size(&mut self, dt: TimeIncrement) {
        self.max_dt = Some(dt);
        self.set_time_step_size(self.dt);
    }

    fn advance_time_step(&mut self) {
        self.time = self.time + self.dt;
        self.step_index += 1;

        let now = Instant::now();
        if let Some(started) = self.step_started_at.replace(now) {
            self.last_step_wall_time = now - started;
        }
    }

    fn time_step_index(&self) -> usize {
        self.step_index
    }

    fn finished(&self) -> bool {
        let remaining = as_seconds(self.end - self.time);
        remaining <= 0.0 || remaining < END_TIME_EPS * as_seconds(self.end - self.start)
    }

    fn report_time_step(&mut self) {
        tracing::info!(
            "[ Time step {} done in {:.3} seconds. Wall clock time: {:.3}, time: {:.6}, time step size: {:.6} ]",
            self.step_index,
            self.last_step_wall_time.as_secs_f64(),
            self.wall_clock_time().as_secs_f64(),
            as_seconds(self.time),
            self.dt.seconds(),
        );
    }

    fn finalize(&mut self) {
        tracing::info!(
            "Simulation took {:.3} seconds for {} time steps, reaching t = {:.6} of {:.6}",
            self.wall_clock_time().as_secs_f64(),
            self.step_index,
            as_seconds(self.time),
            as_seconds(self.end),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::time::seconds;

    fn dt(value: f64) -> TimeIncrement {
        TimeIncrement::from_seconds(value).unwrap()
    }

    #[test]
    fn ten_steps_of_a_tenth_finish_the_unit_interval() {
        let mut clock = CouplingClock::new(seconds(0.0), dt(0.1), seconds(1.0));
        clock.start();

        let mut steps = 0;
        while !clock.finished() {
            clock.advance_time_step();
            clock.set_time_step_size(dt(0.1));
            steps += 1;
        }

        assert_eq!(steps, 10);
        assert_eq!(clock.time_step_index(), 10);
        assert_relative_eq!(as_seconds(clock.time()), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn step_is_clamped_to_remaining_time() {
        let mut clock = CouplingClock::new(seconds(0.0), dt(0.4), seconds(1.0));
        clock.advance_time_step();
        clock.advance_time_step();
        clock.set_time_step_size(dt(0.4));

        assert_relative_eq!(clock.time_step_size().seconds(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn step_is_clamped_to_max_step() {
        let mut clock = CouplingClock::new(seconds(0.0), dt(0.5), seconds(1.0));
        clock.set_max_time_step_size(dt(0.25));
        assert_relative_eq!(clock.time_step_size().seconds(), 0.25);

        clock.set_time_step_size(dt(0.3));
        assert_relative_eq!(clock.time_step_size().seconds(), 0.25);
    }

    #[test]
    fn no_max_step_once_finished() {
        let mut clock = CouplingClock::new(seconds(0.0), dt(1.0), seconds(1.0));
        clock.advance_time_step();
        assert!(clock.finished());
        assert!(clock.max_time_step_size().is_none());
    }

    #[test]
    fn empty_interval_is_finished_immediately() {
        let clock = CouplingClock::new(seconds(2.0), dt(0.1), seconds(2.0));
        assert!(clock.finished());
        assert!(clock.max_time_step_size().is_none());
    }
}
