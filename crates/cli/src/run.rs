//! Builds the heat participant from parameters and drives it.

use std::path::Path;

use nalgebra::DVector;
use tandem_core::{
    CouplingClock, Observer, TimeIncrement,
    framework::{Problem, TimeLoop, VtkWriter},
    seconds,
};
use tandem_coupling::CouplingAdapter;
use tandem_driver::subcycling::{self, Action, Event, Participant, Solution, StartupConfig};
use tandem_heat::{
    BoundaryCondition, HeatAssembler, HeatNewton, HeatProblem, LegacyVtkWriter, RectGrid, Side,
    StandaloneSubstrate,
};
use tandem_observers::{ConvergenceLog, StepLimit, TracingObserver};

use crate::{
    Error,
    config::{ConfigError, Params},
};

/// Builds the problem described by `params`, with the interface side coupled.
///
/// # Errors
///
/// Returns [`Error::Grid`] if the grid is degenerate.
pub fn build_problem(params: &Params) -> Result<HeatProblem, Error> {
    let grid = RectGrid::new(
        params.grid.lower_left,
        params.grid.upper_right,
        params.grid.cells,
    )?;

    let p = &params.problem;
    let interface = params.coupling.interface_side;
    let problem = Side::ALL.into_iter().fold(
        HeatProblem::new(&p.name, grid, p.material(), p.initial_temperature)
            .with_source(p.source),
        |problem, side| match p.boundary.get(side) {
            _ if side == interface => problem.with_boundary(side, BoundaryCondition::Coupled),
            Some(condition) => problem.with_boundary(side, condition),
            None => problem,
        },
    );
    Ok(problem)
}

/// Runs one participant against the standalone substrate configured by
/// `coupling_config`.
///
/// Writes the initial VTK frame, registers the interface, runs the coupling
/// loop, and appends the convergence log.
///
/// # Errors
///
/// Returns an [`Error`] classified by [`Error::exit_code`].
pub fn execute(params: &Params, coupling_config: &Path) -> Result<Solution, Error> {
    let problem = build_problem(params)?;
    let policy = params.coupling.policy()?;
    let newton = HeatNewton::new(params.newton.into()).map_err(|err| ConfigError::Invalid {
        key: "Newton",
        reason: err.to_string(),
    })?;

    let step = |key, value| {
        TimeIncrement::from_seconds(value).map_err(|err| ConfigError::Invalid {
            key,
            reason: err.to_string(),
        })
    };
    let dt_initial = step("TimeLoop.DtInitial", params.time_loop.dt_initial)?;

    let mut clock = CouplingClock::new(
        seconds(0.0),
        dt_initial,
        seconds(params.time_loop.t_end),
    );
    if let Some(max_dt) = params.time_loop.max_time_step_size {
        clock.set_max_time_step_size(step("TimeLoop.MaxTimeStepSize", max_dt)?);
    }

    let name = problem.name().to_string();
    let output = &params.vtk.output_directory;
    let mut solution = DVector::zeros(problem.grid().num_cells());
    problem.apply_initial_solution(&mut solution);

    let mut vtk = LegacyVtkWriter::new(output, &name, problem.grid().clone()).map_err(Error::run)?;
    vtk.write(clock.time(), &solution).map_err(Error::run)?;

    let assembler = HeatAssembler::new(problem);
    let mut participant = Participant::new(assembler, newton, clock, vtk, solution)?;

    let mut adapter = CouplingAdapter::new(StandaloneSubstrate::new());
    adapter.announce_solver(&params.coupling.participant, coupling_config, 0, 1)?;

    let startup = StartupConfig::new(
        &params.coupling.mesh,
        params
            .coupling
            .interface_side
            .extractor()
            .with_tolerance(params.coupling.tolerance),
        dt_initial,
    );
    subcycling::startup(&mut adapter, &mut participant, &policy, &startup)?;
    tracing::debug!("{adapter}");

    let mut log = ConvergenceLog::append(output, &name).map_err(Error::run)?;
    let mut tracer = TracingObserver::new(&name);
    let mut limit = params.time_loop.max_steps.map(StepLimit::new);

    let solution = subcycling::run(
        &mut adapter,
        &mut participant,
        &policy,
        |event: &Event| -> Option<Action> {
            tracer.observe(event);
            log.observe(event);
            limit.as_mut().and_then(|limit| limit.observe(event))
        },
    )?;

    log.finish(&solution).map_err(Error::run)?;
    tracing::info!(
        problem = %name,
        status = ?solution.status,
        accepted_steps = solution.accepted_steps,
        rollbacks = solution.rollbacks,
        frames = participant.vtk().frames().len(),
        "run complete"
    );
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{env, fs, process};

    use approx::assert_relative_eq;
    use tandem_core::as_seconds;
    use tandem_driver::subcycling::Status;

    const PARAMS: &str = r#"
        [TimeLoop]
        TEnd = 1.0
        DtInitial = 0.1

        [Grid]
        LowerLeft = [0.0, 0.0]
        UpperRight = [1.0, 0.5]
        Cells = [4, 2]

        [Problem]
        Name = "solid"
        InitialTemperature = 300.0
        Conductivity = 1.0
        HeatCapacity = 1.0

        [Problem.Boundary]
        Bottom = { Dirichlet = 350.0 }
        Top = "Coupled"

        [Coupling]
        Participant = "Solid"
        Mesh = "Solid-Mesh"
        Read = "Heat-Flux"
        Write = "Temperature"
        InterfaceSide = "Top"
    "#;

    const COUPLING: &str = r#"
        Participant = "Solid"
        Mesh = "Solid-Mesh"
        MaxTimeWindow = 0.25
        EndTime = 1.0
        Scheme = "Implicit"
        Iterations = 2
        Data = ["Temperature", "Heat-Flux"]

        [Peer]
        Heat-Flux = 10.0
    "#;

    fn workspace(name: &str) -> std::path::PathBuf {
        let dir = env::temp_dir().join(format!("tandem-cli-{name}-{}", process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn interface_side_is_always_coupled() {
        let mut params = Params::from_toml(PARAMS, &[]).unwrap();
        params.problem.boundary.top = None;

        let problem = build_problem(&params).unwrap();
        assert_eq!(problem.boundary(Side::Top), BoundaryCondition::Coupled);
        assert_eq!(
            problem.boundary(Side::Bottom),
            BoundaryCondition::Dirichlet(350.0)
        );
        assert_eq!(problem.boundary(Side::Left), BoundaryCondition::Neumann(0.0));
    }

    #[test]
    fn degenerate_grid_is_a_grid_error() {
        let overrides = ["Grid.Cells=[0, 2]".parse().unwrap()];
        let params = Params::from_toml(PARAMS, &overrides).unwrap();
        let err = build_problem(&params).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn implicit_run_writes_frames_and_log() {
        let dir = workspace("implicit");
        let coupling = dir.join("coupling.toml");
        fs::write(&coupling, COUPLING).unwrap();

        let overrides = [format!("Vtk.OutputDirectory={}", dir.display())
            .parse()
            .unwrap()];
        let params = Params::from_toml(PARAMS, &overrides).unwrap();

        let solution = execute(&params, &coupling).unwrap();
        assert_eq!(solution.status, Status::Finished);
        assert_eq!(solution.accepted_steps, 4);
        assert_eq!(solution.rollbacks, 4);
        assert_eq!(solution.newton_solves, 8);
        assert_relative_eq!(as_seconds(solution.final_time), 1.0, epsilon = 1e-9);

        // Initial frame plus one per accepted step.
        let frames = fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "vtk"))
            .count();
        assert_eq!(frames, 5);

        let log = fs::read_to_string(dir.join("solid.log")).unwrap();
        let steps = log.lines().filter(|line| !line.starts_with('#')).count();
        assert_eq!(steps, 4);
        assert!(log.lines().last().unwrap().contains("4 rollbacks"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_coupling_config_is_a_framework_error() {
        let dir = workspace("missing");
        let overrides = [format!("Vtk.OutputDirectory={}", dir.display())
            .parse()
            .unwrap()];
        let params = Params::from_toml(PARAMS, &overrides).unwrap();

        let err = execute(&params, &dir.join("precice-config.xml")).unwrap_err();
        assert_eq!(err.exit_code(), 3);

        fs::remove_dir_all(&dir).unwrap();
    }
}
