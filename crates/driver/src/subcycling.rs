//! Sub-cycling driver for one participant of a partitioned run.
//!
//! Each coupling iteration reads the peer's data, solves, writes this
//! participant's data, and asks the substrate to advance:
//!
//! ```text
//! save checkpoint (if asked) → read → solve → write → advance
//!     → rollback to checkpoint (if asked) | accept
//! ```
//!
//! On rollback the solution and grid variables return to the checkpoint and
//! the clock stays put; no output is written. On acceptance the clock moves,
//! a VTK frame is written, and the next step size is the smaller of the
//! substrate's sub-step and the Newton solver's suggestion.
//!
//! # Example
//!
//! ```ignore
//! use tandem_driver::subcycling;
//!
//! let mut participant = subcycling::Participant::new(assembler, newton, clock, vtk, sol)?;
//! subcycling::startup(&mut adapter, &mut participant, &policy, &config)?;
//! let solution = subcycling::run_unobserved(&mut adapter, &mut participant, &policy)?;
//! ```

mod action;
mod config;
mod error;
mod event;
mod participant;
mod solution;

pub use action::Action;
pub use config::{Startup, StartupConfig};
pub use error::Error;
pub use event::Event;
pub use participant::Participant;
pub use solution::{Solution, Status};

use tandem_core::{
    CouplingSubstrate, Observer, TimeIncrement,
    framework::{
        Assembler, CoupledProblem, FaceIdOf, GridVariables, NewtonSolver, Problem, SolutionOf,
        TimeLoop, VtkWriter,
    },
};
use tandem_coupling::{CheckpointStore, CouplingAdapter, DataExchange};
use uom::si::f64::Time;

/// Registers the interface and negotiates the first step size.
///
/// # Algorithm
///
/// 1. Extract the interface from the participant's grid geometry.
/// 2. Register it with the substrate, which returns the maximum sub-step.
/// 3. If the substrate wants initial data, evaluate the written quantity on
///    the initial solution, send it, and acknowledge.
/// 4. Run the substrate's initial data exchange.
/// 5. Set the step size to the larger of the user's initial step and the
///    substrate's sub-step.
///
/// # Errors
///
/// Returns [`Error::Interface`] if the interface is empty or does not match
/// the substrate's dimension, and [`Error::Coupling`] if the substrate fails.
pub fn startup<S, A, N, T, V, X>(
    adapter: &mut CouplingAdapter<S, FaceIdOf<A::Problem>>,
    participant: &mut Participant<A, N, T, V>,
    exchange: &X,
    config: &StartupConfig,
) -> Result<Startup, Error>
where
    S: CouplingSubstrate,
    A: Assembler,
    A::Problem: CoupledProblem,
    T: TimeLoop,
    X: DataExchange,
{
    let interface = config
        .extractor
        .extract(participant.assembler.problem().grid_geometry())?;
    let vertices = interface.len();

    let substrate_dt = adapter.set_mesh_and_initialize(
        &config.mesh_name,
        interface.dimension,
        interface.coordinates,
        interface.face_ids,
    )?;
    let substrate_dt = positive_step(substrate_dt, "initialize")?;

    let wrote_initial_data = adapter.has_to_write_initial_data();
    if wrote_initial_data {
        exchange.after_solve(
            adapter,
            participant.assembler.problem(),
            &participant.solution,
        )?;
        adapter.announce_initial_data_written()?;
    }
    adapter.initialize_data()?;

    let dt = config.dt_initial.max(substrate_dt);
    participant.time_loop.set_time_step_size(dt);

    tracing::info!(
        vertices,
        user_dt = config.dt_initial.seconds(),
        substrate_dt = substrate_dt.seconds(),
        dt = participant.time_loop.time_step_size().seconds(),
        "coupling initialized"
    );

    Ok(Startup {
        vertices,
        substrate_dt,
        dt: participant.time_loop.time_step_size(),
        wrote_initial_data,
    })
}

/// Runs coupling iterations until the clock or the coupling ends.
///
/// The loop checks `time_loop.finished()` and
/// `adapter.is_coupling_ongoing()` before every iteration. When it ends, the
/// time loop and the adapter are finalized once each.
///
/// # Observer
///
/// The observer receives an [`Event`] after each iteration and may return
/// [`Action::StopEarly`] to end the run.
///
/// # Errors
///
/// A failed Newton solve is fatal and returns [`Error::Solver`]; it never
/// triggers a rollback. Substrate failures return [`Error::Coupling`].
pub fn run<S, A, N, T, V, X, Obs>(
    adapter: &mut CouplingAdapter<S, FaceIdOf<A::Problem>>,
    participant: &mut Participant<A, N, T, V>,
    exchange: &X,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    S: CouplingSubstrate,
    A: Assembler,
    A::Problem: CoupledProblem,
    A::GridVariables: Clone,
    N: NewtonSolver<A>,
    T: TimeLoop,
    V: VtkWriter<SolutionOf<A::Problem>>,
    X: DataExchange,
    Obs: Observer<Event, Action>,
{
    let mut store = CheckpointStore::new();
    let mut rollbacks = 0;
    let mut newton_solves = 0;
    let mut sub_iteration = 0;

    let p = participant;
    p.time_loop.start();

    let status = loop {
        if p.time_loop.finished() {
            break Status::Finished;
        }
        if !adapter.is_coupling_ongoing() {
            break Status::CouplingEnded;
        }

        if adapter.has_to_write_iteration_checkpoint() {
            store.save(&p.solution, p.assembler.grid_variables());
            adapter.announce_iteration_checkpoint_written()?;
        }

        exchange.before_solve(adapter, p.assembler.problem_mut())?;
        p.assembler.set_previous_solution(&p.previous);

        let report = p
            .newton
            .solve(&mut p.assembler, &mut p.solution, &p.time_loop)
            .map_err(Error::solver)?;
        newton_solves += 1;

        exchange.after_solve(adapter, p.assembler.problem(), &p.solution)?;

        let dt = p.time_loop.time_step_size();
        let substrate_dt = adapter.advance(dt)?;

        let event = if adapter.has_to_read_iteration_checkpoint() {
            let (solution, grid_variables) = store.restore()?;
            p.solution = solution;
            *p.assembler.grid_variables_mut() = grid_variables;
            p.assembler
                .grid_variables_mut()
                .update(&p.solution)
                .map_err(Error::framework)?;
            adapter.announce_iteration_checkpoint_read()?;

            let substrate_dt = positive_step(substrate_dt, "advance")?;
            p.time_loop.set_time_step_size(dt.min(substrate_dt));

            rollbacks += 1;
            sub_iteration += 1;

            Event::RolledBack {
                step: p.time_loop.time_step_index() + 1,
                sub_iteration,
                newton_iterations: report.iterations,
            }
        } else {
            p.previous.clone_from(&p.solution);
            p.assembler.grid_variables_mut().advance_time_step();

            p.time_loop.advance_time_step();
            p.vtk
                .write(p.time_loop.time(), &p.solution)
                .map_err(Error::framework)?;
            p.time_loop.report_time_step();

            if adapter.is_coupling_ongoing() {
                let substrate_dt = positive_step(substrate_dt, "advance")?;
                let suggested = p.newton.suggest_time_step_size(substrate_dt);
                p.time_loop.set_time_step_size(substrate_dt.min(suggested));
            }

            let sub_iterations = sub_iteration + 1;
            sub_iteration = 0;

            Event::Accepted {
                step: p.time_loop.time_step_index(),
                time: p.time_loop.time(),
                dt,
                newton_iterations: report.iterations,
                sub_iterations,
            }
        };

        if let Some(Action::StopEarly) = observer.observe(&event) {
            break Status::StoppedByObserver;
        }
    };

    p.time_loop.finalize();
    adapter.finalize()?;

    let solution = Solution {
        status,
        accepted_steps: p.time_loop.time_step_index(),
        rollbacks,
        newton_solves,
        final_time: p.time_loop.time(),
    };

    tracing::info!(
        problem = p.assembler.problem().name(),
        status = ?solution.status,
        accepted_steps = solution.accepted_steps,
        rollbacks,
        newton_solves,
        "coupled run ended"
    );

    Ok(solution)
}

/// Runs the coupled loop without observation.
///
/// This is a convenience wrapper around [`run`] that discards events.
///
/// # Errors
///
/// See [`run`].
pub fn run_unobserved<S, A, N, T, V, X>(
    adapter: &mut CouplingAdapter<S, FaceIdOf<A::Problem>>,
    participant: &mut Participant<A, N, T, V>,
    exchange: &X,
) -> Result<Solution, Error>
where
    S: CouplingSubstrate,
    A: Assembler,
    A::Problem: CoupledProblem,
    A::GridVariables: Clone,
    N: NewtonSolver<A>,
    T: TimeLoop,
    V: VtkWriter<SolutionOf<A::Problem>>,
    X: DataExchange,
{
    run(adapter, participant, exchange, ())
}

/// Converts a sub-step returned by the substrate while coupling continues.
fn positive_step(dt: Time, operation: &str) -> Result<TimeIncrement, Error> {
    TimeIncrement::from_time(dt).map_err(|err| {
        Error::Internal(format!(
            "substrate returned an unusable sub-step from `{operation}`: {err}"
        ))
    })
}
