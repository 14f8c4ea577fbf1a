use approx::assert_relative_eq;
use integration_tests::{
    adapter, participant, startup_config,
    substrate::{Script, ScriptError},
};
use tandem_core::{CouplingAction, Quantity, framework::Assembler};
use tandem_coupling::{ExchangePolicy, InterfaceError, State};
use tandem_driver::subcycling::{self, Error, Status};
use tandem_observers::StepLimit;

const FACES: usize = 10;

#[test]
fn explicit_coupling_writes_one_frame_per_step() {
    let mut adapter = adapter(Script::explicit());
    let mut participant = participant(FACES, 1.0, 0.1);
    let exchange = ExchangePolicy::solid_energy();

    let startup =
        subcycling::startup(&mut adapter, &mut participant, &exchange, &startup_config(0.1))
            .unwrap();
    assert_eq!(startup.vertices, FACES);
    assert!(!startup.wrote_initial_data);
    assert_relative_eq!(startup.dt.seconds(), 0.1);

    let solution = subcycling::run_unobserved(&mut adapter, &mut participant, &exchange).unwrap();
    assert_eq!(solution.status, Status::Finished);
    assert_eq!(solution.accepted_steps, 10);
    assert_eq!(solution.rollbacks, 0);
    assert_eq!(solution.newton_solves, 10);

    let times = participant.vtk().times();
    assert_eq!(times.len(), 10);
    for (k, time) in times.iter().enumerate() {
        assert_relative_eq!(*time, 0.1 * (k + 1) as f64, epsilon = 1e-12);
    }

    // The checkpoint store is never engaged.
    let record = adapter.substrate().record();
    assert_eq!(record.fulfilled(CouplingAction::WriteIterationCheckpoint), 0);
    assert_eq!(record.fulfilled(CouplingAction::ReadIterationCheckpoint), 0);
    assert_eq!(record.reads, 10);
    assert_eq!(record.writes, 10);
    assert_eq!(record.registered_vertices, vec![FACES]);
    assert_eq!(record.initialize_data, 1);

    // Interface faces are the top edge and written in registration order.
    let expected: Vec<f64> = (0..FACES).map(|face| 10.0 + face as f64).collect();
    assert_eq!(record.last_written, expected);

    let received = &participant.assembler().problem().received;
    assert_eq!(received.len(), 10 * FACES);
    assert!(
        received
            .iter()
            .all(|(face, quantity, value)| *face < FACES
                && *quantity == Quantity::HeatFlux
                && *value == 5.0)
    );
}

#[test]
fn implicit_coupling_rolls_back_between_sub_iterations() {
    let mut adapter = adapter(Script::implicit(3));
    let mut participant = participant(FACES, 1.0, 0.1);
    let exchange = ExchangePolicy::solid_energy();

    subcycling::startup(&mut adapter, &mut participant, &exchange, &startup_config(0.1)).unwrap();
    let solution = subcycling::run_unobserved(&mut adapter, &mut participant, &exchange).unwrap();

    assert_eq!(solution.status, Status::Finished);
    assert_eq!(solution.accepted_steps, 10);
    assert_eq!(solution.rollbacks, 20);
    assert_eq!(solution.newton_solves, 30);
    assert_eq!(participant.newton().solves, 30);

    let variables = participant.assembler().grid_variables();
    assert_eq!(variables.time_steps, 10);
    assert_relative_eq!(variables.value, 10.0);

    // Every frame sees exactly one solve per accepted step.
    let frames = &participant.vtk().frames;
    assert_eq!(frames.len(), 10);
    for (k, (_, value)) in frames.iter().enumerate() {
        assert_relative_eq!(*value, (k + 1) as f64);
    }
    assert_relative_eq!(participant.previous_solution()[0], 10.0);

    let record = adapter.substrate().record();
    assert_eq!(record.fulfilled(CouplingAction::WriteIterationCheckpoint), 10);
    assert_eq!(record.fulfilled(CouplingAction::ReadIterationCheckpoint), 20);
}

#[test]
fn substrate_shrinks_the_step_below_newton_suggestion() {
    let script = Script {
        sub_steps: vec![0.05],
        ..Script::explicit()
    };
    let mut adapter = adapter(script);
    let mut participant = participant(FACES, 1.0, 0.1);
    let exchange = ExchangePolicy::solid_energy();

    subcycling::startup(&mut adapter, &mut participant, &exchange, &startup_config(0.1)).unwrap();
    let solution = subcycling::run_unobserved(&mut adapter, &mut participant, &exchange).unwrap();

    let advances = &adapter.substrate().record().advances;
    assert_relative_eq!(advances[0].0, 0.1);
    assert_relative_eq!(advances[1].0, 0.05);

    let times = participant.vtk().times();
    assert_relative_eq!(times[0], 0.1);
    assert_relative_eq!(times[1], 0.15, epsilon = 1e-12);
    assert_eq!(solution.accepted_steps, 19);
    assert_eq!(times.len(), 19);
}

#[test]
fn empty_interface_fails_before_registration() {
    let mut adapter = adapter(Script::explicit());
    let mut participant = participant(0, 1.0, 0.1);
    let exchange = ExchangePolicy::solid_energy();

    let result =
        subcycling::startup(&mut adapter, &mut participant, &exchange, &startup_config(0.1));
    assert!(matches!(
        result,
        Err(Error::Interface(InterfaceError::EmptyInterface))
    ));
    assert!(adapter.substrate().record().registered_vertices.is_empty());
    assert_eq!(adapter.state(), State::Announced);
}

#[test]
fn dimension_mismatch_fails_at_startup() {
    let script = Script {
        dimension: 3,
        ..Script::explicit()
    };
    let mut adapter = adapter(script);
    let mut participant = participant(FACES, 1.0, 0.1);
    let exchange = ExchangePolicy::solid_energy();

    let result =
        subcycling::startup(&mut adapter, &mut participant, &exchange, &startup_config(0.1));
    assert!(matches!(
        result,
        Err(Error::Interface(InterfaceError::DimensionMismatch {
            substrate: 3,
            grid: 2
        }))
    ));
    assert!(adapter.substrate().record().registered_vertices.is_empty());
}

#[test]
fn coupling_end_stops_the_run_and_finalizes_once() {
    let script = Script {
        end_time: 0.6,
        ..Script::explicit()
    };
    let mut adapter = adapter(script);
    let mut participant = participant(FACES, 1.0, 0.1);
    let exchange = ExchangePolicy::solid_energy();

    subcycling::startup(&mut adapter, &mut participant, &exchange, &startup_config(0.1)).unwrap();
    let solution = subcycling::run_unobserved(&mut adapter, &mut participant, &exchange).unwrap();

    assert_eq!(solution.status, Status::CouplingEnded);
    assert_eq!(solution.accepted_steps, 6);
    assert_eq!(participant.vtk().frames.len(), 6);
    assert_relative_eq!(participant.vtk().times()[5], 0.6, epsilon = 1e-12);

    assert_eq!(adapter.substrate().record().finalized, 1);
    assert_eq!(participant.time_loop().finalized, 1);
    assert_eq!(adapter.state(), State::Finalized);
    assert!(!adapter.is_coupling_ongoing());
}

#[test]
fn initial_data_is_written_before_the_first_exchange() {
    let script = Script {
        initial_data: true,
        ..Script::explicit()
    };
    let mut adapter = adapter(script);
    let mut participant = participant(FACES, 1.0, 0.1);
    let exchange = ExchangePolicy::solid_energy();

    let startup =
        subcycling::startup(&mut adapter, &mut participant, &exchange, &startup_config(0.1))
            .unwrap();
    assert!(startup.wrote_initial_data);

    let record = adapter.substrate().record();
    assert_eq!(record.writes, 1);
    assert_eq!(record.fulfilled(CouplingAction::WriteInitialData), 1);
    let expected: Vec<f64> = (0..FACES).map(|face| face as f64).collect();
    assert_eq!(record.last_written, expected);
}

#[test]
fn larger_of_user_and_substrate_step_starts_the_run() {
    let script = Script {
        initial_dt: 0.25,
        ..Script::explicit()
    };
    let mut adapter = adapter(script);
    let mut participant = participant(FACES, 1.0, 0.1);
    let exchange = ExchangePolicy::solid_energy();

    let startup =
        subcycling::startup(&mut adapter, &mut participant, &exchange, &startup_config(0.1))
            .unwrap();
    assert_relative_eq!(startup.substrate_dt.seconds(), 0.25);
    assert_relative_eq!(startup.dt.seconds(), 0.25);
}

#[test]
fn observer_can_stop_the_run() {
    let mut adapter = adapter(Script::implicit(2));
    let mut participant = participant(FACES, 1.0, 0.1);
    let exchange = ExchangePolicy::solid_energy();

    subcycling::startup(&mut adapter, &mut participant, &exchange, &startup_config(0.1)).unwrap();
    let solution =
        subcycling::run(&mut adapter, &mut participant, &exchange, StepLimit::new(3)).unwrap();

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.accepted_steps, 3);
    assert_eq!(solution.rollbacks, 3);
    assert_eq!(participant.vtk().frames.len(), 3);
    assert_eq!(adapter.substrate().record().finalized, 1);
    assert_eq!(participant.time_loop().finalized, 1);
}

#[test]
fn wrong_mesh_name_is_a_coupling_error() {
    let mut adapter = adapter(Script::explicit());
    let mut participant = participant(FACES, 1.0, 0.1);
    let exchange = ExchangePolicy::solid_energy();

    let mut config = startup_config(0.1);
    config.mesh_name = "Other-Mesh".into();

    let err = subcycling::startup(&mut adapter, &mut participant, &exchange, &config).unwrap_err();
    let Error::Coupling(inner) = &err else {
        panic!("expected a coupling error, got {err:?}");
    };
    let source = std::error::Error::source(inner).unwrap();
    assert!(source.downcast_ref::<ScriptError>().is_some());
}
