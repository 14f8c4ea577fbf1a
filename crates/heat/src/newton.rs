use nalgebra::DVector;
use tandem_core::{
    TimeIncrement,
    framework::{Assembler, GridVariables, NewtonReport, NewtonSolver, TimeLoop},
};
use thiserror::Error;

use crate::{HeatAssembler, VariablesError};

/// Errors that can occur during a Newton solve.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("newton did not converge in {iterations} iterations (residual reduction {reduction:e})")]
    NotConverged { iterations: usize, reduction: f64 },

    #[error("singular jacobian at newton iteration {iteration}")]
    Singular { iteration: usize },

    #[error("non-finite residual at newton iteration {iteration}")]
    NonFinite { iteration: usize },

    #[error(transparent)]
    Variables(#[from] VariablesError),

    #[error("invalid newton configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Configuration for [`HeatNewton`].
///
/// Defaults follow the usual finite-volume framework settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonConfig {
    /// Maximum number of updates per solve.
    pub max_steps: usize,

    /// Iteration count the step-size controller aims for.
    pub target_steps: usize,

    /// Converged once the residual falls below this fraction of the initial
    /// residual.
    pub residual_reduction: f64,

    /// Converged once the largest relative update falls below this value.
    pub max_relative_shift: f64,
}

impl NewtonConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::InvalidConfig`] if a limit is zero or a
    /// tolerance is outside `(0, 1)`.
    pub fn validate(&self) -> Result<(), SolveError> {
        if self.max_steps == 0 {
            return Err(SolveError::InvalidConfig("max_steps must be at least 1"));
        }
        if self.target_steps == 0 {
            return Err(SolveError::InvalidConfig("target_steps must be at least 1"));
        }
        let in_unit = |x: f64| x > 0.0 && x < 1.0;
        if !in_unit(self.residual_reduction) {
            return Err(SolveError::InvalidConfig(
                "residual_reduction must lie in (0, 1)",
            ));
        }
        if !in_unit(self.max_relative_shift) {
            return Err(SolveError::InvalidConfig(
                "max_relative_shift must lie in (0, 1)",
            ));
        }
        Ok(())
    }
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_steps: 18,
            target_steps: 10,
            residual_reduction: 1e-5,
            max_relative_shift: 1e-8,
        }
    }
}

/// Newton–Raphson for [`HeatAssembler`] with a dense LU linear solve.
#[derive(Debug, Clone)]
pub struct HeatNewton {
    config: NewtonConfig,
    last_iterations: usize,
}

impl HeatNewton {
    /// # Errors
    ///
    /// Returns [`SolveError::InvalidConfig`] for an invalid configuration.
    pub fn new(config: NewtonConfig) -> Result<Self, SolveError> {
        config.validate()?;
        Ok(Self {
            config,
            last_iterations: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    /// Iterations of the most recent converged solve.
    #[must_use]
    pub fn last_iterations(&self) -> usize {
        self.last_iterations
    }
}

impl NewtonSolver<HeatAssembler> for HeatNewton {
    type Error = SolveError;

    fn solve<T: TimeLoop>(
        &mut self,
        assembler: &mut HeatAssembler,
        solution: &mut DVector<f64>,
        time_loop: &T,
    ) -> Result<NewtonReport, SolveError> {
        let dt = time_loop.time_step_size().seconds();
        let mut initial_norm = None;
        let mut shift = f64::INFINITY;
        let mut iterations = 0;

        loop {
            assembler.grid_variables_mut().update(solution)?;
            let (residual, jacobian) = assembler.assemble(solution, dt);

            let norm = residual.norm();
            if !norm.is_finite() {
                return Err(SolveError::NonFinite {
                    iteration: iterations,
                });
            }
            let initial = *initial_norm.get_or_insert(norm);
            let reduction = if initial > 0.0 { norm / initial } else { 0.0 };

            let converged = norm == 0.0
                || (iterations > 0
                    && (reduction <= self.config.residual_reduction
                        || shift <= self.config.max_relative_shift));
            if converged {
                self.last_iterations = iterations;
                return Ok(NewtonReport {
                    iterations,
                    residual_reduction: reduction,
                });
            }
            if iterations == self.config.max_steps {
                return Err(SolveError::NotConverged {
                    iterations,
                    reduction,
                });
            }

            let delta = jacobian.lu().solve(&residual).ok_or(SolveError::Singular {
                iteration: iterations,
            })?;
            shift = relative_shift(solution, &delta);
            *solution -= delta;
            iterations += 1;
        }
    }

    /// Grows the step when the last solve needed fewer iterations than the
    /// target and shrinks it when it needed more.
    fn suggest_time_step_size(&self, hint: TimeIncrement) -> TimeIncrement {
        let n = self.last_iterations as f64;
        let target = self.config.target_steps as f64;

        let factor = if n > target {
            1.0 / (1.0 + (n - target) / target)
        } else {
            1.0 + (target - n) / target / 1.2
        };

        TimeIncrement::from_time(hint.into_inner() * factor).unwrap_or(hint)
    }
}

fn relative_shift(solution: &DVector<f64>, delta: &DVector<f64>) -> f64 {
    solution
        .iter()
        .zip(delta.iter())
        .map(|(x, dx)| dx.abs() / x.abs().max(1.0))
        .fold(0.0, f64::max)
}
